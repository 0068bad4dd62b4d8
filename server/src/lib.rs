//! HTTP shell for the Box Office checkout pipeline.
//!
//! This crate wires the pure logic in `box-office-core` to the outside
//! world:
//!
//! - **Ledger client** (`ledger`): the hosted record store holding the
//!   Offerings and Tickets collections, reached over REST behind a trait so
//!   tests run against an in-memory double.
//! - **Payment Processor client** (`payment`): checkout-session creation,
//!   also trait-seamed.
//! - **Webhook signature verification** (`signature`): raw-body HMAC check,
//!   the security boundary in front of fulfillment.
//! - **HTTP endpoints** (`api`): catalog listing, checkout submission, the
//!   fulfillment webhook, the PDF staging store, and the check-in lookup.
//!
//! The server binary lives in `src/bin/server.rs`.

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod config;
pub mod error;
pub mod ledger;
pub mod payment;
pub mod pdf_store;
pub mod server;
pub mod signature;

pub use config::Config;
pub use error::ApiError;
pub use server::routes::build_router;
pub use server::state::AppState;
