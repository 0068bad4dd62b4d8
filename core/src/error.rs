//! Error taxonomy for the checkout-to-fulfillment pipeline.

use crate::types::OfferingId;
use thiserror::Error;

/// Everything that can go wrong between "user submits selected tickets" and
/// "ticket records exist in the Ledger".
///
/// The HTTP mapping lives in the server crate; the variants here carry the
/// information a caller needs to act on the failure (e.g. the actual
/// remaining count on [`CheckoutError::InsufficientAvailability`], so the
/// client can offer a reduced quantity).
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The Ledger or Payment Processor could not be reached. Retryable from
    /// the caller's point of view.
    #[error("upstream service unavailable: {reason}")]
    UpstreamUnavailable {
        /// What failed, for logs and the error body.
        reason: String,
    },

    /// The offering has no remaining tickets.
    #[error("tickets for {offering} are sold out")]
    SoldOut {
        /// The sold-out offering.
        offering: OfferingId,
    },

    /// Fewer tickets remain than were requested.
    #[error("only {remaining} ticket(s) remaining for {offering}, {requested} requested")]
    InsufficientAvailability {
        /// The constrained offering.
        offering: OfferingId,
        /// Actual remaining count at validation time.
        remaining: u32,
        /// The quantity that was asked for.
        requested: u32,
    },

    /// The Ledger's remaining-count field was missing or unparseable. We do
    /// not guess in either direction.
    #[error("availability for {offering} could not be determined")]
    AvailabilityUnknown {
        /// The offering with the unreadable count.
        offering: OfferingId,
    },

    /// No selection carried a positive quantity.
    #[error("no tickets selected")]
    InvalidSelection,

    /// A required attendee field was absent or blank.
    #[error("missing required field: {field}")]
    MissingAttendeeField {
        /// The field name, in the client payload's naming.
        field: &'static str,
    },

    /// Webhook signature verification failed. Security rejection: no Ledger
    /// write may have happened when this is returned.
    #[error("webhook signature verification failed: {reason}")]
    SignatureInvalid {
        /// Why verification failed (bad header shape, digest mismatch,
        /// timestamp outside tolerance).
        reason: String,
    },

    /// Some ticket-record writes failed during fulfillment. Surfaced as a
    /// 5xx so the Payment Processor redelivers; the idempotent diff in the
    /// webhook handler makes the retry complete the order without
    /// duplicating the records that did land.
    #[error("{failed} of {total} ticket record(s) failed to write")]
    PartialFulfillmentFailure {
        /// Number of failed writes.
        failed: usize,
        /// Number of attempted writes.
        total: usize,
    },

    /// Session metadata could not be decoded back into an order.
    #[error("order metadata invalid: {reason}")]
    MetadataInvalid {
        /// Decoding failure detail.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_availability_message_carries_counts() {
        let err = CheckoutError::InsufficientAvailability {
            offering: OfferingId::from("recA"),
            remaining: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "only 3 ticket(s) remaining for recA, 5 requested"
        );
    }

    #[test]
    fn signature_failure_is_distinct_from_upstream_failure() {
        let sig = CheckoutError::SignatureInvalid {
            reason: "digest mismatch".to_string(),
        };
        assert!(sig.to_string().contains("signature"));
    }
}
