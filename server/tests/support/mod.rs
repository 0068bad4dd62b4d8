//! Shared test doubles and fixtures: an in-memory Ledger, a recording
//! Payment Processor, and a router builder wired to both.

#![allow(clippy::expect_used)] // Panics: test setup failures should abort loudly
#![allow(dead_code, clippy::cast_precision_loss)] // Not every test binary uses every helper

use async_trait::async_trait;
use axum_test::TestServer;
use box_office_core::{
    CheckoutError, EventOffering, Money, OfferingId, SessionRef, TicketRecord,
};
use box_office_server::config::PaymentConfig;
use box_office_server::ledger::{CatalogOffering, Ledger, TicketLookup};
use box_office_server::payment::{
    CheckoutSessionHandle, CheckoutSessionRequest, PaymentProcessor,
};
use box_office_server::pdf_store::PdfStore;
use box_office_server::signature::SignatureVerifier;
use box_office_server::{build_router, AppState};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Webhook signing secret shared between the test verifier and test signer.
pub const TEST_WEBHOOK_SECRET: &str = "whsec_test";

/// In-memory [`Ledger`] double. Offerings are seeded up front; ticket and
/// dispatch writes accumulate for assertions. Individual ticket writes can
/// be made to fail by order-scoped number, to exercise partial fulfillment.
#[derive(Default)]
pub struct InMemoryLedger {
    offerings: Mutex<HashMap<String, CatalogOffering>>,
    tickets: Mutex<Vec<TicketRecord>>,
    dispatches: Mutex<Vec<String>>,
    lookups: Mutex<HashMap<String, TicketLookup>>,
    fail_ticket_number: Mutex<Option<u32>>,
}

impl InMemoryLedger {
    pub fn seed_offering(&self, entry: CatalogOffering) {
        self.offerings
            .lock()
            .expect("offerings lock")
            .insert(entry.offering.id.to_string(), entry);
    }

    pub fn tickets(&self) -> Vec<TicketRecord> {
        self.tickets.lock().expect("tickets lock").clone()
    }

    pub fn dispatches(&self) -> Vec<String> {
        self.dispatches.lock().expect("dispatches lock").clone()
    }

    /// Make writes for the given order-scoped ticket number fail until
    /// cleared with `None`.
    pub fn set_fail_ticket_number(&self, number: Option<u32>) {
        *self.fail_ticket_number.lock().expect("fail flag lock") = number;
    }

    pub fn seed_ticket_lookup(&self, record_id: &str, lookup: TicketLookup) {
        self.lookups
            .lock()
            .expect("lookups lock")
            .insert(record_id.to_string(), lookup);
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn list_offerings(&self) -> Result<Vec<CatalogOffering>, CheckoutError> {
        let mut entries: Vec<CatalogOffering> = self
            .offerings
            .lock()
            .expect("offerings lock")
            .values()
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.offering.id.to_string().cmp(&b.offering.id.to_string()));
        Ok(entries)
    }

    async fn get_offering(&self, id: &OfferingId) -> Result<EventOffering, CheckoutError> {
        self.offerings
            .lock()
            .expect("offerings lock")
            .get(id.as_str())
            .map(|entry| entry.offering.clone())
            .ok_or_else(|| CheckoutError::UpstreamUnavailable {
                reason: format!("no offering {id}"),
            })
    }

    async fn create_ticket(&self, ticket: &TicketRecord) -> Result<(), CheckoutError> {
        let fail = *self.fail_ticket_number.lock().expect("fail flag lock");
        if fail.is_some() && ticket.number.map(|n| n.number) == fail {
            return Err(CheckoutError::UpstreamUnavailable {
                reason: "injected write failure".to_string(),
            });
        }
        self.tickets
            .lock()
            .expect("tickets lock")
            .push(ticket.clone());
        Ok(())
    }

    async fn tickets_for_session(
        &self,
        session: &SessionRef,
    ) -> Result<Vec<TicketRecord>, CheckoutError> {
        Ok(self
            .tickets
            .lock()
            .expect("tickets lock")
            .iter()
            .filter(|t| t.session == *session)
            .cloned()
            .collect())
    }

    async fn create_dispatch_record(&self, session: &SessionRef) -> Result<(), CheckoutError> {
        self.dispatches
            .lock()
            .expect("dispatches lock")
            .push(session.to_string());
        Ok(())
    }

    async fn has_dispatch_record(&self, session: &SessionRef) -> Result<bool, CheckoutError> {
        Ok(self
            .dispatches
            .lock()
            .expect("dispatches lock")
            .iter()
            .any(|s| s == session.as_str()))
    }

    async fn get_ticket(&self, record_id: &str) -> Result<Option<TicketLookup>, CheckoutError> {
        Ok(self
            .lookups
            .lock()
            .expect("lookups lock")
            .get(record_id)
            .cloned())
    }
}

/// Recording [`PaymentProcessor`] double: returns a fixed session handle
/// and keeps every request for assertions.
#[derive(Default)]
pub struct RecordingProcessor {
    requests: Mutex<Vec<CheckoutSessionRequest>>,
}

impl RecordingProcessor {
    pub fn requests(&self) -> Vec<CheckoutSessionRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl PaymentProcessor for RecordingProcessor {
    async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> Result<CheckoutSessionHandle, CheckoutError> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request);
        Ok(CheckoutSessionHandle {
            session: SessionRef::from("cs_test_123"),
            url: "https://processor.test/pay/cs_test_123".to_string(),
        })
    }
}

fn payment_config() -> PaymentConfig {
    PaymentConfig {
        api_base: "https://processor.test".to_string(),
        secret_key: "sk_test".to_string(),
        webhook_secret: TEST_WEBHOOK_SECRET.to_string(),
        success_url: "https://shop.test/success?session_id={CHECKOUT_SESSION_ID}".to_string(),
        cancel_url: "https://shop.test/cancel".to_string(),
        signature_tolerance: 300,
        request_timeout: 10,
    }
}

/// Build a test server over the real router, returning the doubles for
/// seeding and assertions.
pub fn test_server() -> (TestServer, Arc<InMemoryLedger>, Arc<RecordingProcessor>) {
    let ledger = Arc::new(InMemoryLedger::default());
    let processor = Arc::new(RecordingProcessor::default());
    let state = AppState::new(
        ledger.clone(),
        processor.clone(),
        Arc::new(SignatureVerifier::new(
            TEST_WEBHOOK_SECRET.to_string(),
            300,
        )),
        Arc::new(PdfStore::new(300)),
        Arc::new(payment_config()),
    );
    let server = TestServer::new(build_router(state)).expect("test server should build");
    (server, ledger, processor)
}

/// A catalog entry with sensible defaults for one offering row.
pub fn offering(
    id: &str,
    ticket_type: &str,
    price_minor: u64,
    remaining: Option<u32>,
    price_ref: Option<&str>,
) -> CatalogOffering {
    CatalogOffering {
        offering: EventOffering {
            id: OfferingId::from(id),
            show_name: "Winter Concert".to_string(),
            display_name: format!("Winter Concert ({ticket_type})"),
            ticket_type: ticket_type.to_string(),
            price: Money::from_minor(price_minor),
            currency: "GBP".to_string(),
            remaining,
            max_per_purchase: 6,
            price_ref: price_ref.map(ToString::to_string),
            date_time: "Sat 14 Mar, 7:30pm".to_string(),
            venue_address: "Union Chapel, London".to_string(),
        },
        description: "A night of song".to_string(),
        image_url: String::new(),
        doors_performance: "Doors 7pm / Performance 7:30pm".to_string(),
        ticket_type_price: format!("{ticket_type} £{}.00", price_minor / 100),
        booking_fee: 1.0,
        booking_fee_message: "Includes booking fee".to_string(),
        currency_symbol: "£".to_string(),
        total_cost: (price_minor as f64) / 100.0 + 1.0,
    }
}
