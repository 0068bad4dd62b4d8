//! Availability policy over point-in-time Ledger snapshots.
//!
//! Counts are not reserved: validation here is advisory, taken at
//! checkout-session creation only. Between this check and payment completion
//! another buyer can take the last tickets. This is an accepted limitation of the
//! design (no hold/reservation mechanism), documented rather than patched.

use crate::error::CheckoutError;
use crate::types::{EventOffering, TicketSelection};

/// Validate one requested quantity against an offering snapshot.
///
/// Policy, in order:
/// - remaining count missing or unparseable → [`CheckoutError::AvailabilityUnknown`]
///   (we assume neither sold-out nor available);
/// - remaining count zero → [`CheckoutError::SoldOut`];
/// - requested quantity above remaining → [`CheckoutError::InsufficientAvailability`]
///   carrying the actual remaining count.
///
/// # Errors
///
/// Returns the first policy violation above; `Ok(())` means this selection
/// is satisfiable against the snapshot.
pub fn check_availability(
    offering: &EventOffering,
    selection: &TicketSelection,
) -> Result<(), CheckoutError> {
    let Some(remaining) = offering.remaining else {
        return Err(CheckoutError::AvailabilityUnknown {
            offering: offering.id.clone(),
        });
    };

    if remaining == 0 {
        return Err(CheckoutError::SoldOut {
            offering: offering.id.clone(),
        });
    }

    if selection.quantity > remaining {
        return Err(CheckoutError::InsufficientAvailability {
            offering: offering.id.clone(),
            remaining,
            requested: selection.quantity,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Money, OfferingId};

    fn offering(remaining: Option<u32>) -> EventOffering {
        EventOffering {
            id: OfferingId::from("recA"),
            show_name: "Winter Concert".to_string(),
            display_name: "Winter Concert (Saturday)".to_string(),
            ticket_type: "Standard".to_string(),
            price: Money::from_minor(1500),
            currency: "GBP".to_string(),
            remaining,
            max_per_purchase: 6,
            price_ref: Some("price_123".to_string()),
            date_time: "Sat 14 Mar, 7:30pm".to_string(),
            venue_address: "Union Chapel, London".to_string(),
        }
    }

    fn selection(quantity: u32) -> TicketSelection {
        TicketSelection {
            offering: OfferingId::from("recA"),
            quantity,
            ticket_type: "Standard".to_string(),
            price_ref: Some("price_123".to_string()),
            unit_price: Money::from_minor(1500),
        }
    }

    #[test]
    fn accepts_quantity_within_remaining() {
        assert!(check_availability(&offering(Some(10)), &selection(4)).is_ok());
        assert!(check_availability(&offering(Some(3)), &selection(3)).is_ok());
    }

    #[test]
    fn unknown_count_is_neither_sold_out_nor_available() {
        let err = check_availability(&offering(None), &selection(1));
        assert!(matches!(
            err,
            Err(CheckoutError::AvailabilityUnknown { .. })
        ));
    }

    #[test]
    fn zero_remaining_is_sold_out() {
        let err = check_availability(&offering(Some(0)), &selection(1));
        assert!(matches!(err, Err(CheckoutError::SoldOut { .. })));
    }

    #[test]
    #[allow(clippy::panic)] // Panics: test fails on the wrong variant
    fn over_request_reports_actual_remaining() {
        let err = check_availability(&offering(Some(3)), &selection(5));
        match err {
            Err(CheckoutError::InsufficientAvailability {
                remaining,
                requested,
                ..
            }) => {
                assert_eq!(remaining, 3);
                assert_eq!(requested, 5);
            }
            other => panic!("expected InsufficientAvailability, got {other:?}"),
        }
    }
}
