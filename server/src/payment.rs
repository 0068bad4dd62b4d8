//! Payment Processor client: checkout-session creation.
//!
//! The processor's session API takes a form-encoded body: line items (either
//! a pre-registered price reference or inline price data), success/cancel
//! redirect targets, the customer email, and a string-keyed metadata map.
//! Trait-seamed like the Ledger so tests record requests instead of making
//! them.

use crate::config::PaymentConfig;
use async_trait::async_trait;
use box_office_core::{CheckoutError, Money, SessionRef};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// One checkout line item.
#[derive(Clone, Debug, PartialEq)]
pub enum LineItem {
    /// Backed by a price reference registered with the processor.
    PriceRef {
        /// The registered price reference.
        price: String,
        /// Quantity.
        quantity: u32,
    },
    /// Priced inline, for offerings without a registered reference and for
    /// the zero-amount companion item.
    Inline {
        /// Product name shown on the checkout page.
        name: String,
        /// Unit amount.
        unit_amount: Money,
        /// ISO currency code (lowercased on the wire).
        currency: String,
        /// Quantity.
        quantity: u32,
    },
}

/// A session-creation request.
#[derive(Clone, Debug, PartialEq)]
pub struct CheckoutSessionRequest {
    /// Line items, at least one.
    pub line_items: Vec<LineItem>,
    /// Customer email prefilled into the checkout page.
    pub customer_email: String,
    /// Redirect target after successful payment.
    pub success_url: String,
    /// Redirect target after abandoned payment.
    pub cancel_url: String,
    /// Order state for the fulfillment webhook (size-ceilinged upstream).
    pub metadata: HashMap<String, String>,
}

/// The opaque handle the client redirects into.
#[derive(Clone, Debug, PartialEq)]
pub struct CheckoutSessionHandle {
    /// Session reference.
    pub session: SessionRef,
    /// Hosted checkout page URL.
    pub url: String,
}

/// The external checkout/payment service, abstracted.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Create a checkout session.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::UpstreamUnavailable`] when the processor is
    /// unreachable or rejects the request.
    async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> Result<CheckoutSessionHandle, CheckoutError>;
}

/// REST-backed [`PaymentProcessor`] implementation.
pub struct RestPaymentProcessor {
    client: reqwest::Client,
    config: PaymentConfig,
}

impl RestPaymentProcessor {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::UpstreamUnavailable`] if the HTTP client
    /// cannot be constructed.
    pub fn new(config: PaymentConfig) -> Result<Self, CheckoutError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()
            .map_err(|e| CheckoutError::UpstreamUnavailable {
                reason: format!("payment client construction failed: {e}"),
            })?;
        Ok(Self { client, config })
    }
}

#[derive(Deserialize)]
struct SessionResponse {
    id: String,
    #[serde(default)]
    url: Option<String>,
}

#[async_trait]
impl PaymentProcessor for RestPaymentProcessor {
    async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> Result<CheckoutSessionHandle, CheckoutError> {
        let form = session_form(&request, &self.config);

        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.config.api_base))
            .bearer_auth(&self.config.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| CheckoutError::UpstreamUnavailable {
                reason: format!("session creation failed: {e}"),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CheckoutError::UpstreamUnavailable {
                reason: format!("session creation rejected ({status}): {body}"),
            });
        }

        let session: SessionResponse =
            response
                .json()
                .await
                .map_err(|e| CheckoutError::UpstreamUnavailable {
                    reason: format!("session response decoding failed: {e}"),
                })?;

        Ok(CheckoutSessionHandle {
            session: SessionRef::new(session.id),
            url: session.url.unwrap_or_default(),
        })
    }
}

/// Flatten a session request into the processor's indexed form encoding.
fn session_form(
    request: &CheckoutSessionRequest,
    config: &PaymentConfig,
) -> Vec<(String, String)> {
    let mut form = vec![
        ("mode".to_string(), "payment".to_string()),
        (
            "payment_method_types[0]".to_string(),
            "card".to_string(),
        ),
        ("success_url".to_string(), config.success_url.clone()),
        ("cancel_url".to_string(), config.cancel_url.clone()),
        (
            "customer_email".to_string(),
            request.customer_email.clone(),
        ),
    ];

    for (i, item) in request.line_items.iter().enumerate() {
        match item {
            LineItem::PriceRef { price, quantity } => {
                form.push((format!("line_items[{i}][price]"), price.clone()));
                form.push((format!("line_items[{i}][quantity]"), quantity.to_string()));
            }
            LineItem::Inline {
                name,
                unit_amount,
                currency,
                quantity,
            } => {
                form.push((
                    format!("line_items[{i}][price_data][currency]"),
                    currency.to_lowercase(),
                ));
                form.push((
                    format!("line_items[{i}][price_data][unit_amount]"),
                    unit_amount.as_minor().to_string(),
                ));
                form.push((
                    format!("line_items[{i}][price_data][product_data][name]"),
                    name.clone(),
                ));
                form.push((format!("line_items[{i}][quantity]"), quantity.to_string()));
            }
        }
    }

    let mut metadata: Vec<(&String, &String)> = request.metadata.iter().collect();
    metadata.sort();
    for (key, value) in metadata {
        form.push((format!("metadata[{key}]"), value.clone()));
    }

    form
}
