//! Webhook signature verification.
//!
//! The Payment Processor signs each delivery with a shared secret:
//! `HMAC-SHA256(secret, "{timestamp}.{raw body}")`, carried in a header of
//! the form `t=<unix seconds>,v1=<hex digest>` (multiple `v1` entries are
//! allowed during secret rotation). Verification needs the byte-exact
//! request body, which is why the webhook route never parses before
//! verifying, and uses a constant-time digest comparison. The timestamp is
//! bounded to a configured tolerance against replay.

use box_office_core::CheckoutError;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "payment-signature";

/// Verifies signed webhook deliveries against the shared secret.
pub struct SignatureVerifier {
    secret: String,
    tolerance: Duration,
}

impl SignatureVerifier {
    /// Build a verifier with a tolerance in seconds.
    #[must_use]
    pub fn new(secret: String, tolerance_secs: i64) -> Self {
        Self {
            secret,
            tolerance: Duration::seconds(tolerance_secs),
        }
    }

    /// Verify a delivery.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::SignatureInvalid`] when the header is
    /// malformed, the timestamp falls outside the tolerance window, or no
    /// candidate digest matches.
    pub fn verify(
        &self,
        body: &[u8],
        header: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CheckoutError> {
        let (timestamp, candidates) = parse_header(header)?;

        let age = now.timestamp() - timestamp;
        if age.abs() > self.tolerance.num_seconds() {
            return Err(CheckoutError::SignatureInvalid {
                reason: "timestamp outside tolerance".to_string(),
            });
        }

        for candidate in &candidates {
            let Ok(digest) = hex::decode(candidate) else {
                continue;
            };
            let Ok(mut mac) = HmacSha256::new_from_slice(self.secret.as_bytes()) else {
                continue;
            };
            mac.update(timestamp.to_string().as_bytes());
            mac.update(b".");
            mac.update(body);
            // verify_slice is constant-time.
            if mac.verify_slice(&digest).is_ok() {
                return Ok(());
            }
        }

        Err(CheckoutError::SignatureInvalid {
            reason: "no matching digest".to_string(),
        })
    }

    /// Produce a valid header for a body at a given time. Test support for
    /// exercising the webhook endpoint end to end.
    #[must_use]
    pub fn sign(&self, body: &[u8], at: DateTime<Utc>) -> String {
        let timestamp = at.timestamp();
        let digest = HmacSha256::new_from_slice(self.secret.as_bytes()).map_or_else(
            |_| String::new(),
            |mut mac| {
                mac.update(timestamp.to_string().as_bytes());
                mac.update(b".");
                mac.update(body);
                hex::encode(mac.finalize().into_bytes())
            },
        );
        format!("t={timestamp},v1={digest}")
    }
}

/// Split `t=...,v1=...[,v1=...]` into the timestamp and candidate digests.
fn parse_header(header: &str) -> Result<(i64, Vec<&str>), CheckoutError> {
    let mut timestamp = None;
    let mut candidates = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => {
                timestamp = value.parse::<i64>().ok();
            }
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| CheckoutError::SignatureInvalid {
        reason: "missing or unparseable timestamp".to_string(),
    })?;
    if candidates.is_empty() {
        return Err(CheckoutError::SignatureInvalid {
            reason: "no v1 digest present".to_string(),
        });
    }

    Ok((timestamp, candidates))
}
