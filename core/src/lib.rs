//! Domain model and pure business logic for the Box Office checkout pipeline.
//!
//! This crate is the functional core of the ticket shop: everything here is
//! synchronous, I/O-free, and deterministic, so the interesting invariants
//! (ticket numbering, companion issuance, idempotent refulfillment, metadata
//! round-trips) are testable at memory speed. The imperative shell (HTTP
//! endpoints, the Ledger client, the Payment Processor client) lives in
//! `box-office-server` and only orchestrates what this crate decides.
//!
//! # Pipeline
//!
//! ```text
//! catalog projection ──▶ client selection
//!                              │
//!                              ▼
//!                    availability policy   (availability.rs)
//!                              │
//!                              ▼
//!                     metadata encoding    (metadata.rs)
//!                              │
//!                              ▼  (Payment Processor, external)
//!                              │
//!                     webhook event decode (webhook.rs)
//!                              │
//!                              ▼
//!                     fulfillment plan     (fulfillment.rs)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod availability;
pub mod error;
pub mod fulfillment;
pub mod metadata;
pub mod types;
pub mod webhook;

pub use availability::check_availability;
pub use error::CheckoutError;
pub use fulfillment::{FulfillmentPlan, PlannedTicket};
pub use metadata::{OrderMetadata, METADATA_TICKET_DATA_CEILING};
pub use types::{
    AttendeeDetails, CheckoutOrder, CompanionRequest, EventOffering, Money, OfferingId,
    SessionRef, TicketRecord, TicketSelection, TicketStatus,
};
pub use webhook::WebhookEvent;
