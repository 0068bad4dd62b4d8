//! Ledger client: the hosted record store holding Offerings and Tickets.
//!
//! The store exposes base/table-addressed REST endpoints returning records
//! as `{id, fields}` pairs, with bearer-token auth, view-filtered listing,
//! and formula-filtered lookup. Everything the rest of the crate needs goes
//! through the [`Ledger`] trait so tests can substitute an in-memory double;
//! [`RestLedger`] is the production implementation.
//!
//! Remaining counts are read here but never written: the Ledger decrements
//! them itself when ticket records are created.

use crate::config::LedgerConfig;
use async_trait::async_trait;
use box_office_core::{
    AttendeeDetails, CheckoutError, EventOffering, Money, OfferingId, SessionRef, TicketRecord,
    TicketStatus,
};
use box_office_core::types::TicketNumber;
use serde_json::{json, Map, Value};
use std::time::Duration;

/// A catalog row: the sellable offering plus the display-only fields the
/// selector UI renders (description, image, fees).
#[derive(Clone, Debug, PartialEq)]
pub struct CatalogOffering {
    /// The domain offering.
    pub offering: EventOffering,
    /// Show description.
    pub description: String,
    /// Show image URL, empty when none uploaded.
    pub image_url: String,
    /// "Doors + performance" display string.
    pub doors_performance: String,
    /// Combined type + price display label.
    pub ticket_type_price: String,
    /// Booking fee in major units.
    pub booking_fee: f64,
    /// Booking fee explanation shown at checkout.
    pub booking_fee_message: String,
    /// Currency symbol for display.
    pub currency_symbol: String,
    /// Unit price + booking fee, in major units.
    pub total_cost: f64,
}

/// A ticket record as seen by the check-in collaborator.
#[derive(Clone, Debug, PartialEq)]
pub struct TicketLookup {
    /// Attendee display name.
    pub name: String,
    /// Linked offering identifiers.
    pub event_ids: Vec<String>,
    /// Whether the ticket has been scanned.
    pub checked_in: bool,
    /// Check-in timestamp display string, if scanned.
    pub checkin_time: Option<String>,
    /// Who scanned it, if scanned.
    pub checkin_by: Option<String>,
}

/// The hosted record store, abstracted.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// List the currently-onsale offerings (unfiltered; the catalog endpoint
    /// drops rows without a price reference).
    ///
    /// # Errors
    ///
    /// [`CheckoutError::UpstreamUnavailable`] when the store is unreachable.
    async fn list_offerings(&self) -> Result<Vec<CatalogOffering>, CheckoutError>;

    /// Fetch one offering by record id, for availability validation.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::UpstreamUnavailable`] when the store is unreachable
    /// or the record does not exist.
    async fn get_offering(&self, id: &OfferingId) -> Result<EventOffering, CheckoutError>;

    /// Create one ticket record.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::UpstreamUnavailable`] when the write fails.
    async fn create_ticket(&self, ticket: &TicketRecord) -> Result<(), CheckoutError>;

    /// All ticket records already written for a payment session.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::UpstreamUnavailable`] when the store is unreachable.
    async fn tickets_for_session(
        &self,
        session: &SessionRef,
    ) -> Result<Vec<TicketRecord>, CheckoutError>;

    /// Create the fulfillment-dispatch row that triggers downstream ticket
    /// delivery, keyed by session reference.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::UpstreamUnavailable`] when the write fails.
    async fn create_dispatch_record(&self, session: &SessionRef) -> Result<(), CheckoutError>;

    /// Whether a dispatch row already exists for this session. Deduplicates
    /// the dispatch write across redeliveries independently of the ticket
    /// records, which may all be missing after a failed first attempt.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::UpstreamUnavailable`] when the store is unreachable.
    async fn has_dispatch_record(&self, session: &SessionRef) -> Result<bool, CheckoutError>;

    /// Look up one ticket record for the check-in collaborator.
    ///
    /// Returns `Ok(None)` when the record does not exist.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::UpstreamUnavailable`] when the store is unreachable.
    async fn get_ticket(&self, record_id: &str) -> Result<Option<TicketLookup>, CheckoutError>;
}

/// REST-backed [`Ledger`] implementation.
pub struct RestLedger {
    client: reqwest::Client,
    config: LedgerConfig,
}

impl RestLedger {
    /// Build a client from configuration. Outbound calls are single-attempt
    /// with a bounded timeout; retry policy belongs to the transport layer,
    /// not here.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::UpstreamUnavailable`] if the HTTP client
    /// cannot be constructed.
    pub fn new(config: LedgerConfig) -> Result<Self, CheckoutError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()
            .map_err(|e| CheckoutError::UpstreamUnavailable {
                reason: format!("ledger client construction failed: {e}"),
            })?;
        Ok(Self { client, config })
    }

    fn table_url(&self, table: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.api_base, self.config.base_id, table
        )
    }

    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, CheckoutError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.config.api_key)
            .query(query)
            .send()
            .await
            .map_err(|e| CheckoutError::UpstreamUnavailable {
                reason: format!("ledger request failed: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(CheckoutError::UpstreamUnavailable {
                reason: format!("ledger responded {}", response.status()),
            });
        }

        response
            .json()
            .await
            .map_err(|e| CheckoutError::UpstreamUnavailable {
                reason: format!("ledger response decoding failed: {e}"),
            })
    }

    async fn post_fields(&self, table: &str, fields: Value) -> Result<(), CheckoutError> {
        let response = self
            .client
            .post(self.table_url(table))
            .bearer_auth(&self.config.api_key)
            .json(&json!({ "fields": fields }))
            .send()
            .await
            .map_err(|e| CheckoutError::UpstreamUnavailable {
                reason: format!("ledger write failed: {e}"),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CheckoutError::UpstreamUnavailable {
                reason: format!("ledger write rejected ({status}): {body}"),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl Ledger for RestLedger {
    async fn list_offerings(&self) -> Result<Vec<CatalogOffering>, CheckoutError> {
        let body = self
            .get_json(
                &self.table_url(&self.config.offerings_table),
                &[("view", self.config.onsale_view.as_str())],
            )
            .await?;

        Ok(records(&body)
            .iter()
            .filter_map(catalog_offering_from_record)
            .collect())
    }

    async fn get_offering(&self, id: &OfferingId) -> Result<EventOffering, CheckoutError> {
        let url = format!(
            "{}/{}",
            self.table_url(&self.config.offerings_table),
            id.as_str()
        );
        let record = self.get_json(&url, &[]).await?;
        offering_from_record(&record).ok_or_else(|| CheckoutError::UpstreamUnavailable {
            reason: format!("offering record {id} is malformed"),
        })
    }

    async fn create_ticket(&self, ticket: &TicketRecord) -> Result<(), CheckoutError> {
        self.post_fields(&self.config.tickets_table, ticket_fields(ticket))
            .await
    }

    async fn tickets_for_session(
        &self,
        session: &SessionRef,
    ) -> Result<Vec<TicketRecord>, CheckoutError> {
        let formula = format!("{{Session ID}}='{}'", session.as_str());
        let body = self
            .get_json(
                &self.table_url(&self.config.tickets_table),
                &[("filterByFormula", formula.as_str())],
            )
            .await?;

        Ok(records(&body)
            .iter()
            .filter_map(|record| ticket_from_record(record, session))
            .collect())
    }

    async fn create_dispatch_record(&self, session: &SessionRef) -> Result<(), CheckoutError> {
        self.post_fields(
            &self.config.dispatch_table,
            json!({ "Session ID": session.as_str() }),
        )
        .await
    }

    async fn has_dispatch_record(&self, session: &SessionRef) -> Result<bool, CheckoutError> {
        let formula = format!("{{Session ID}}='{}'", session.as_str());
        let body = self
            .get_json(
                &self.table_url(&self.config.dispatch_table),
                &[("filterByFormula", formula.as_str())],
            )
            .await?;
        Ok(!records(&body).is_empty())
    }

    async fn get_ticket(&self, record_id: &str) -> Result<Option<TicketLookup>, CheckoutError> {
        let url = format!(
            "{}/{}",
            self.table_url(&self.config.tickets_table),
            record_id
        );
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(|e| CheckoutError::UpstreamUnavailable {
                reason: format!("ledger request failed: {e}"),
            })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(CheckoutError::UpstreamUnavailable {
                reason: format!("ledger responded {}", response.status()),
            });
        }

        let record: Value =
            response
                .json()
                .await
                .map_err(|e| CheckoutError::UpstreamUnavailable {
                    reason: format!("ledger response decoding failed: {e}"),
                })?;
        Ok(Some(lookup_from_record(&record)))
    }
}

// ============================================================================
// Record (de)shaping
// ============================================================================

fn records(body: &Value) -> Vec<Value> {
    body.get("records")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn fields(record: &Value) -> Map<String, Value> {
    record
        .get("fields")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

fn str_field(fields: &Map<String, Value>, name: &str) -> String {
    match fields.get(name) {
        // Lookup fields come back as single-element arrays.
        Some(Value::Array(values)) => values
            .first()
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

fn num_field(fields: &Map<String, Value>, name: &str) -> Option<f64> {
    match fields.get(name) {
        Some(Value::Array(values)) => values.first().and_then(Value::as_f64),
        Some(value) => value.as_f64(),
        None => None,
    }
}

/// Parse the remaining count strictly: anything that is not a number is
/// `None` (availability unknown), never zero. Negative counts (the Ledger
/// oversold) clamp to zero, which reads as sold out.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn remaining_field(fields: &Map<String, Value>) -> Option<u32> {
    num_field(fields, "Tickets Remaining")
        .filter(|n| n.is_finite())
        .map(|n| n.max(0.0) as u32)
}

fn offering_from_record(record: &Value) -> Option<EventOffering> {
    let id = record.get("id")?.as_str()?.to_string();
    let f = fields(record);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let max_per_purchase = num_field(&f, "Max Tickets Per Purchase").unwrap_or(6.0) as u32;

    Some(EventOffering {
        id: OfferingId::new(id),
        show_name: str_field(&f, "Event Name"),
        display_name: {
            let display = str_field(&f, "Display Name");
            if display.is_empty() {
                str_field(&f, "Event Name")
            } else {
                display
            }
        },
        ticket_type: {
            let t = str_field(&f, "Ticket Type");
            if t.is_empty() { "Standard".to_string() } else { t }
        },
        price: Money::from_major(num_field(&f, "Ticket Price").unwrap_or(0.0)),
        currency: {
            let c = str_field(&f, "Currency");
            if c.is_empty() { "GBP".to_string() } else { c }
        },
        remaining: remaining_field(&f),
        max_per_purchase,
        price_ref: f
            .get("Price Reference")
            .and_then(Value::as_str)
            .map(ToString::to_string),
        date_time: str_field(&f, "Date + Time Friendly"),
        venue_address: str_field(&f, "Venue Address"),
    })
}

fn catalog_offering_from_record(record: &Value) -> Option<CatalogOffering> {
    let offering = offering_from_record(record)?;
    let f = fields(record);

    let image_url = f
        .get("Event Image")
        .and_then(Value::as_array)
        .and_then(|images| images.first())
        .and_then(|image| image.get("url"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Some(CatalogOffering {
        description: str_field(&f, "Event Description"),
        image_url,
        doors_performance: str_field(&f, "Doors + Performance Time"),
        ticket_type_price: {
            let t = str_field(&f, "Ticket Type + Price");
            if t.is_empty() { offering.ticket_type.clone() } else { t }
        },
        booking_fee: num_field(&f, "Booking Fee").unwrap_or(0.0),
        booking_fee_message: str_field(&f, "Booking Fee Message"),
        currency_symbol: {
            let s = str_field(&f, "Currency Symbol");
            if s.is_empty() { "£".to_string() } else { s }
        },
        total_cost: num_field(&f, "Total Cost").unwrap_or(0.0),
        offering,
    })
}

/// Shape one ticket record into the Tickets-table field map.
///
/// The offering link uses the Ledger's linked-record convention (an array of
/// record ids); the linked row supplies type/date lookups on the Ledger
/// side. Companion tickets get no "Ticket Number" field at all.
fn ticket_fields(ticket: &TicketRecord) -> Value {
    let mut f = Map::new();
    f.insert(
        "Event".to_string(),
        json!([ticket.offering.as_str()]),
    );
    f.insert("Event Name".to_string(), json!(ticket.event_name));
    f.insert("First Name".to_string(), json!(ticket.attendee.first_name));
    f.insert("Surname".to_string(), json!(ticket.attendee.surname));
    f.insert("Email".to_string(), json!(ticket.attendee.email));
    f.insert("Phone".to_string(), json!(ticket.attendee.phone));
    f.insert("Post Code".to_string(), json!(ticket.attendee.postcode));
    f.insert("Session ID".to_string(), json!(ticket.session.as_str()));
    f.insert("Amount Paid".to_string(), json!(ticket.amount_paid.as_major()));
    f.insert("Ticket Type".to_string(), json!(ticket.ticket_type));
    f.insert(
        "Status".to_string(),
        json!(match ticket.status {
            TicketStatus::Valid => "Valid",
            TicketStatus::CheckedIn => "Checked In",
        }),
    );
    f.insert("Currency".to_string(), json!(ticket.currency));
    f.insert(
        "Mailing List Opt In".to_string(),
        json!(ticket.mailing_opt_in),
    );
    f.insert("Companion".to_string(), json!(ticket.companion));
    f.insert("Date + Time".to_string(), json!(ticket.date_time));
    f.insert("Venue Address".to_string(), json!(ticket.venue_address));
    if let Some(number) = ticket.number {
        f.insert("Ticket Number".to_string(), json!(number.to_string()));
    }
    Value::Object(f)
}

/// Parse `"2 of 3"` back into a [`TicketNumber`].
fn parse_ticket_number(value: &str) -> Option<TicketNumber> {
    let (number, total) = value.split_once(" of ")?;
    Some(TicketNumber {
        number: number.trim().parse().ok()?,
        total: total.trim().parse().ok()?,
    })
}

fn ticket_from_record(record: &Value, session: &SessionRef) -> Option<TicketRecord> {
    let f = fields(record);
    if f.is_empty() {
        return None;
    }

    Some(TicketRecord {
        offering: OfferingId::new(str_field(&f, "Event")),
        event_name: str_field(&f, "Event Name"),
        attendee: AttendeeDetails {
            first_name: str_field(&f, "First Name"),
            surname: str_field(&f, "Surname"),
            email: str_field(&f, "Email"),
            phone: str_field(&f, "Phone"),
            postcode: str_field(&f, "Post Code"),
        },
        session: session.clone(),
        amount_paid: Money::from_major(num_field(&f, "Amount Paid").unwrap_or(0.0)),
        ticket_type: str_field(&f, "Ticket Type"),
        number: parse_ticket_number(&str_field(&f, "Ticket Number")),
        status: if str_field(&f, "Status") == "Checked In" {
            TicketStatus::CheckedIn
        } else {
            TicketStatus::Valid
        },
        companion: f.get("Companion").and_then(Value::as_bool).unwrap_or(false),
        currency: str_field(&f, "Currency"),
        mailing_opt_in: f
            .get("Mailing List Opt In")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        date_time: str_field(&f, "Date + Time"),
        venue_address: str_field(&f, "Venue Address"),
    })
}

fn lookup_from_record(record: &Value) -> TicketLookup {
    let f = fields(record);
    TicketLookup {
        name: {
            let name = str_field(&f, "Name");
            if name.is_empty() {
                format!(
                    "{} {}",
                    str_field(&f, "First Name"),
                    str_field(&f, "Surname")
                )
                .trim()
                .to_string()
            } else {
                name
            }
        },
        event_ids: f
            .get("Event")
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(Value::as_str)
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        checked_in: f
            .get("Checked In")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        checkin_time: f
            .get("Check-in Time")
            .and_then(Value::as_str)
            .map(ToString::to_string),
        checkin_by: f
            .get("Check-in By")
            .and_then(Value::as_str)
            .map(ToString::to_string),
    }
}
