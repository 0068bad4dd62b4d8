//! Typed decoding of Payment Processor webhook deliveries.
//!
//! The processor posts a JSON envelope whose `type` field discriminates the
//! event. Rather than scattering presence checks through the handler, the
//! envelope is decoded once, here, into a tagged [`WebhookEvent`]; only
//! [`WebhookEvent::CheckoutCompleted`] drives fulfillment, and everything
//! else is acknowledged untouched so the processor stops redelivering it.
//!
//! Signature verification happens BEFORE this decode, against the raw
//! bytes. Parsing an unverified body is fine, acting on one is not.

use crate::error::CheckoutError;
use crate::types::{Money, SessionRef};
use serde::Deserialize;
use std::collections::HashMap;

/// The processor event type that triggers fulfillment.
pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// A completed checkout session as carried in the event envelope.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletedSession {
    /// Session reference (the fulfillment idempotency key).
    pub session: SessionRef,
    /// Settled order total.
    pub amount_total: Money,
    /// The session's string-keyed metadata map.
    pub metadata: HashMap<String, String>,
}

/// A webhook delivery, decoded once at the boundary.
#[derive(Clone, Debug, PartialEq)]
pub enum WebhookEvent {
    /// A checkout session finished paying; fulfillment may proceed.
    CheckoutCompleted(CompletedSession),
    /// Any other event type. Acknowledged and ignored.
    Ignored {
        /// The envelope's `type` field, for logging.
        event_type: String,
    },
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    data: Option<EnvelopeData>,
}

#[derive(Deserialize)]
struct EnvelopeData {
    object: SessionObject,
}

#[derive(Deserialize)]
struct SessionObject {
    id: String,
    #[serde(default)]
    amount_total: Option<u64>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

impl WebhookEvent {
    /// Decode a (signature-verified) delivery body.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::MetadataInvalid`] if the body is not a
    /// well-formed event envelope, or if a completed-checkout envelope lacks
    /// its session object.
    pub fn parse(body: &[u8]) -> Result<Self, CheckoutError> {
        let envelope: Envelope =
            serde_json::from_slice(body).map_err(|e| CheckoutError::MetadataInvalid {
                reason: format!("event envelope decoding failed: {e}"),
            })?;

        if envelope.event_type != CHECKOUT_COMPLETED {
            return Ok(Self::Ignored {
                event_type: envelope.event_type,
            });
        }

        let session = envelope
            .data
            .ok_or_else(|| CheckoutError::MetadataInvalid {
                reason: "completed-checkout event has no data object".to_string(),
            })?
            .object;

        Ok(Self::CheckoutCompleted(CompletedSession {
            session: SessionRef::new(session.id),
            amount_total: Money::from_minor(session.amount_total.unwrap_or(0)),
            metadata: session.metadata,
        }))
    }
}
