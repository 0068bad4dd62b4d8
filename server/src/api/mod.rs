//! HTTP endpoint handlers.
//!
//! One module per endpoint: catalog listing, checkout submission, the
//! fulfillment webhook, the check-in lookup, and PDF staging.

pub mod check_ticket;
pub mod checkout;
pub mod events;
pub mod pdf;
pub mod webhook;
