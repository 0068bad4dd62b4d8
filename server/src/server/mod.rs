//! HTTP server wiring: router, shared state, health probe.

pub mod health;
pub mod routes;
pub mod state;
