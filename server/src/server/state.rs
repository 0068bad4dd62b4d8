//! Application state for the Box Office HTTP server.

use crate::config::PaymentConfig;
use crate::ledger::Ledger;
use crate::payment::PaymentProcessor;
use crate::pdf_store::PdfStore;
use crate::signature::SignatureVerifier;
use std::sync::Arc;

/// Shared resources behind every HTTP handler, cloned (cheaply via Arc) per
/// request.
///
/// The Ledger and Payment Processor sit behind traits so integration tests
/// swap in in-memory doubles; the signature verifier and PDF store are plain
/// shared values.
#[derive(Clone)]
pub struct AppState {
    /// Hosted record store (Offerings + Tickets).
    pub ledger: Arc<dyn Ledger>,
    /// Checkout-session creation.
    pub payment: Arc<dyn PaymentProcessor>,
    /// Webhook delivery verification.
    pub signature: Arc<SignatureVerifier>,
    /// TTL'd staging arena for generated ticket PDFs.
    pub pdf_store: Arc<PdfStore>,
    /// Redirect targets for session creation.
    pub payment_config: Arc<PaymentConfig>,
}

impl AppState {
    /// Assemble the state from its parts.
    #[must_use]
    pub fn new(
        ledger: Arc<dyn Ledger>,
        payment: Arc<dyn PaymentProcessor>,
        signature: Arc<SignatureVerifier>,
        pdf_store: Arc<PdfStore>,
        payment_config: Arc<PaymentConfig>,
    ) -> Self {
        Self {
            ledger,
            payment,
            signature,
            pdf_store,
            payment_config,
        }
    }
}
