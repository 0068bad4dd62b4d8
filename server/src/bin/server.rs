//! Box Office Server
//!
//! Binds the HTTP surface: catalog listing, checkout submission, the
//! fulfillment webhook, check-in lookup, and PDF staging.
//!
//! # Usage
//!
//! ```bash
//! # Configure .env (LEDGER_*, PAYMENT_*), then:
//! cargo run --bin server
//! ```

use box_office_server::ledger::RestLedger;
use box_office_server::payment::RestPaymentProcessor;
use box_office_server::pdf_store::PdfStore;
use box_office_server::signature::SignatureVerifier;
use box_office_server::{build_router, AppState, Config};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,box_office_server=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🎟️ Box office opening");

    let config = Config::from_env();
    for secret in config.missing_secrets() {
        tracing::warn!(secret, "required secret is not set");
    }
    tracing::info!(
        ledger = %config.ledger.api_base,
        payment = %config.payment.api_base,
        "Configuration loaded"
    );

    let ledger = Arc::new(RestLedger::new(config.ledger.clone())?);
    let payment = Arc::new(RestPaymentProcessor::new(config.payment.clone())?);
    let signature = Arc::new(SignatureVerifier::new(
        config.payment.webhook_secret.clone(),
        config.payment.signature_tolerance,
    ));
    let pdf_store = Arc::new(PdfStore::new(config.server.pdf_ttl));

    let state = AppState::new(
        ledger,
        payment,
        signature,
        pdf_store,
        Arc::new(config.payment.clone()),
    );
    let router = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "🎟️ Taking orders");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Box office closing");
        })
        .await?;

    Ok(())
}
