//! Configuration management for the Box Office server.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Secrets (the Ledger API key, the processor secret key, the webhook
//! signing secret) have no defaults and are read as empty strings when
//! unset; the binary logs loudly at startup rather than guessing.

use serde::{Deserialize, Serialize};
use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Hosted record-store (Ledger) configuration
    pub ledger: LedgerConfig,
    /// Payment Processor configuration
    pub payment: PaymentConfig,
    /// HTTP server configuration
    pub server: ServerConfig,
}

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// REST API base, e.g. `https://api.airtable.com/v0`
    pub api_base: String,
    /// Base (workspace) identifier
    pub base_id: String,
    /// Offerings table identifier
    pub offerings_table: String,
    /// Tickets table identifier
    pub tickets_table: String,
    /// Fulfillment-dispatch table identifier (downstream delivery automation)
    pub dispatch_table: String,
    /// Bearer API key
    pub api_key: String,
    /// Name of the view listing currently-onsale offerings
    pub onsale_view: String,
    /// Outbound request timeout in seconds (single attempt, no retries)
    pub request_timeout: u64,
}

/// Payment Processor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfig {
    /// REST API base for session creation
    pub api_base: String,
    /// Secret API key
    pub secret_key: String,
    /// Webhook signing secret shared with the processor
    pub webhook_secret: String,
    /// Redirect target after successful payment
    pub success_url: String,
    /// Redirect target after abandoned payment
    pub cancel_url: String,
    /// Webhook timestamp tolerance in seconds
    pub signature_tolerance: i64,
    /// Outbound request timeout in seconds
    pub request_timeout: u64,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Staged PDF time-to-live in seconds
    pub pdf_ttl: u64,
}

impl Config {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            ledger: LedgerConfig {
                api_base: env::var("LEDGER_API_BASE")
                    .unwrap_or_else(|_| "https://api.airtable.com/v0".to_string()),
                base_id: env::var("LEDGER_BASE_ID").unwrap_or_default(),
                offerings_table: env::var("LEDGER_OFFERINGS_TABLE").unwrap_or_default(),
                tickets_table: env::var("LEDGER_TICKETS_TABLE").unwrap_or_default(),
                dispatch_table: env::var("LEDGER_DISPATCH_TABLE").unwrap_or_default(),
                api_key: env::var("LEDGER_API_KEY").unwrap_or_default(),
                onsale_view: env::var("LEDGER_ONSALE_VIEW")
                    .unwrap_or_else(|_| "Currently onsale".to_string()),
                request_timeout: env::var("LEDGER_REQUEST_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            },
            payment: PaymentConfig {
                api_base: env::var("PAYMENT_API_BASE")
                    .unwrap_or_else(|_| "https://api.stripe.com".to_string()),
                secret_key: env::var("PAYMENT_SECRET_KEY").unwrap_or_default(),
                webhook_secret: env::var("PAYMENT_WEBHOOK_SECRET").unwrap_or_default(),
                success_url: env::var("CHECKOUT_SUCCESS_URL").unwrap_or_else(|_| {
                    "https://example.com/ticket-success?session_id={CHECKOUT_SESSION_ID}"
                        .to_string()
                }),
                cancel_url: env::var("CHECKOUT_CANCEL_URL")
                    .unwrap_or_else(|_| "https://example.com/ticket-incomplete".to_string()),
                signature_tolerance: env::var("PAYMENT_SIGNATURE_TOLERANCE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
                request_timeout: env::var("PAYMENT_REQUEST_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            },
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(8080),
                pdf_ttl: env::var("PDF_TTL_SECONDS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            },
        }
    }

    /// Names of required secrets that are currently unset.
    #[must_use]
    pub fn missing_secrets(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.ledger.api_key.is_empty() {
            missing.push("LEDGER_API_KEY");
        }
        if self.payment.secret_key.is_empty() {
            missing.push("PAYMENT_SECRET_KEY");
        }
        if self.payment.webhook_secret.is_empty() {
            missing.push("PAYMENT_WEBHOOK_SECRET");
        }
        missing
    }
}
