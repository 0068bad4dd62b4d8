//! Compact order serialization for the Payment Processor metadata channel.
//!
//! The processor's session metadata is a narrow string-keyed map with a hard
//! total-size ceiling, so the ticket list is minimized to `[offering id,
//! quantity, ticket-type label]` triples; attendee data and display strings
//! go in as scalar fields once, never duplicated per ticket. The webhook
//! decodes the same map back into an [`OrderMetadata`] to drive fulfillment.
//!
//! The `eventName` key doubles as the marker that a completed session is a
//! ticket order at all: other products share the same webhook endpoint, and
//! their sessions simply lack it.

use crate::error::CheckoutError;
use crate::types::{AttendeeDetails, CheckoutOrder, CompanionRequest, OfferingId};
use std::collections::HashMap;

/// Maximum encoded length of the `ticketsData` value, in characters.
///
/// Kept well under the processor's per-session metadata budget so the scalar
/// fields always fit alongside it.
pub const METADATA_TICKET_DATA_CEILING: usize = 500;

/// Metadata key marking a session as a ticket order.
pub const MARKER_KEY: &str = "eventName";

/// Metadata key holding the minimized ticket list.
pub const TICKETS_KEY: &str = "ticketsData";

/// One minimized ticket selection as carried through session metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedSelection {
    /// Offering record identifier.
    pub offering: OfferingId,
    /// Requested quantity.
    pub quantity: u32,
    /// Ticket-type label (drives the companion accessible-type check).
    pub ticket_type: String,
}

/// The order state that survives the trip through the Payment Processor.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderMetadata {
    /// Minimized selections, in submitted (numbering) order.
    pub selections: Vec<EncodedSelection>,
    /// Attendee identity.
    pub attendee: AttendeeDetails,
    /// Show/event display name; presence of this field is the ticket-order
    /// marker.
    pub event_name: String,
    /// Display date/time string.
    pub date_time: String,
    /// Display venue string.
    pub venue_address: String,
    /// ISO currency code.
    pub currency: String,
    /// Marketing opt-in flag.
    pub mailing_opt_in: bool,
    /// Companion ticket request, if any.
    pub companion: Option<CompanionRequest>,
}

impl OrderMetadata {
    /// Minimize a submitted order for the metadata channel.
    #[must_use]
    pub fn from_order(order: &CheckoutOrder) -> Self {
        Self {
            selections: order
                .selections
                .iter()
                .map(|s| EncodedSelection {
                    offering: s.offering.clone(),
                    quantity: s.quantity,
                    ticket_type: s.ticket_type.clone(),
                })
                .collect(),
            attendee: order.attendee.clone(),
            event_name: order.event_name.clone(),
            date_time: order.date_time.clone(),
            venue_address: order.venue_address.clone(),
            currency: order.currency.clone(),
            mailing_opt_in: order.mailing_opt_in,
            companion: order.companion.clone(),
        }
    }

    /// Encode into the string-keyed map the Payment Processor accepts.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::MetadataInvalid`] if the encoded ticket list
    /// would exceed [`METADATA_TICKET_DATA_CEILING`]; orders that large
    /// cannot be reconstructed at fulfillment time and must be rejected up
    /// front rather than truncated.
    pub fn encode(&self) -> Result<HashMap<String, String>, CheckoutError> {
        let triples: Vec<(&str, u32, &str)> = self
            .selections
            .iter()
            .map(|s| (s.offering.as_str(), s.quantity, s.ticket_type.as_str()))
            .collect();
        let tickets_data =
            serde_json::to_string(&triples).map_err(|e| CheckoutError::MetadataInvalid {
                reason: format!("ticket list encoding failed: {e}"),
            })?;

        if tickets_data.chars().count() > METADATA_TICKET_DATA_CEILING {
            return Err(CheckoutError::MetadataInvalid {
                reason: format!(
                    "encoded ticket data is {} characters, ceiling is {METADATA_TICKET_DATA_CEILING}",
                    tickets_data.chars().count()
                ),
            });
        }

        let mut map = HashMap::from([
            (MARKER_KEY.to_string(), self.event_name.clone()),
            (TICKETS_KEY.to_string(), tickets_data),
            ("firstName".to_string(), self.attendee.first_name.clone()),
            ("surname".to_string(), self.attendee.surname.clone()),
            ("attendeeEmail".to_string(), self.attendee.email.clone()),
            ("phone".to_string(), self.attendee.phone.clone()),
            ("postcode".to_string(), self.attendee.postcode.clone()),
            ("dateTime".to_string(), self.date_time.clone()),
            ("venueAddress".to_string(), self.venue_address.clone()),
            ("currency".to_string(), self.currency.clone()),
            (
                "mailingListOptIn".to_string(),
                self.mailing_opt_in.to_string(),
            ),
        ]);

        if let Some(companion) = &self.companion {
            map.insert("companionTicket".to_string(), "true".to_string());
            map.insert(
                "companionTicketData".to_string(),
                serde_json::to_string(&(companion.offering.as_str(), &companion.ticket_type))
                    .map_err(|e| CheckoutError::MetadataInvalid {
                        reason: format!("companion encoding failed: {e}"),
                    })?,
            );
        }

        Ok(map)
    }

    /// Decode a completed session's metadata map.
    ///
    /// Returns `Ok(None)` when the ticket-order marker is absent, meaning the
    /// session belongs to some other product sharing the webhook endpoint
    /// and must be skipped, not failed.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::MetadataInvalid`] when the marker is present
    /// but the rest of the map cannot be reconstructed into an order.
    pub fn decode(map: &HashMap<String, String>) -> Result<Option<Self>, CheckoutError> {
        let Some(event_name) = map.get(MARKER_KEY) else {
            return Ok(None);
        };

        let tickets_data = require(map, TICKETS_KEY)?;
        let triples: Vec<(String, u32, String)> =
            serde_json::from_str(tickets_data).map_err(|e| CheckoutError::MetadataInvalid {
                reason: format!("ticket list decoding failed: {e}"),
            })?;

        let companion = if map.get("companionTicket").map(String::as_str) == Some("true") {
            let data = require(map, "companionTicketData")?;
            let (offering, ticket_type): (String, String) =
                serde_json::from_str(data).map_err(|e| CheckoutError::MetadataInvalid {
                    reason: format!("companion decoding failed: {e}"),
                })?;
            Some(CompanionRequest {
                offering: OfferingId::new(offering),
                ticket_type,
            })
        } else {
            None
        };

        Ok(Some(Self {
            selections: triples
                .into_iter()
                .map(|(offering, quantity, ticket_type)| EncodedSelection {
                    offering: OfferingId::new(offering),
                    quantity,
                    ticket_type,
                })
                .collect(),
            attendee: AttendeeDetails {
                first_name: require(map, "firstName")?.clone(),
                surname: require(map, "surname")?.clone(),
                email: require(map, "attendeeEmail")?.clone(),
                phone: require(map, "phone")?.clone(),
                postcode: map.get("postcode").cloned().unwrap_or_default(),
            },
            event_name: event_name.clone(),
            date_time: map.get("dateTime").cloned().unwrap_or_default(),
            venue_address: map.get("venueAddress").cloned().unwrap_or_default(),
            currency: map
                .get("currency")
                .cloned()
                .unwrap_or_else(|| "GBP".to_string()),
            mailing_opt_in: map.get("mailingListOptIn").map(String::as_str) == Some("true"),
            companion,
        }))
    }
}

fn require<'a>(
    map: &'a HashMap<String, String>,
    key: &str,
) -> Result<&'a String, CheckoutError> {
    map.get(key).ok_or_else(|| CheckoutError::MetadataInvalid {
        reason: format!("missing metadata field: {key}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CheckoutOrder, Money, TicketSelection};

    fn order() -> CheckoutOrder {
        CheckoutOrder {
            selections: vec![
                TicketSelection {
                    offering: OfferingId::from("recA"),
                    quantity: 2,
                    ticket_type: "Standard".to_string(),
                    price_ref: Some("price_A".to_string()),
                    unit_price: Money::from_minor(1500),
                },
                TicketSelection {
                    offering: OfferingId::from("recB"),
                    quantity: 1,
                    ticket_type: "Accessible / Wheelchair".to_string(),
                    price_ref: None,
                    unit_price: Money::from_minor(1200),
                },
            ],
            attendee: AttendeeDetails {
                first_name: "Ada".to_string(),
                surname: "Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                phone: "07000000000".to_string(),
                postcode: "N1 1AA".to_string(),
            },
            event_name: "Winter Concert".to_string(),
            date_time: "Sat 14 Mar, 7:30pm".to_string(),
            venue_address: "Union Chapel, London".to_string(),
            currency: "GBP".to_string(),
            mailing_opt_in: true,
            companion: Some(CompanionRequest {
                offering: OfferingId::from("recC"),
                ticket_type: "ACCESS COMPANION".to_string(),
            }),
        }
    }

    #[test]
    #[allow(clippy::expect_used)] // Panics: test fails if the codec fails
    fn round_trip_preserves_offerings_and_quantities() {
        let meta = OrderMetadata::from_order(&order());
        let map = meta.encode().expect("encoding should succeed");
        let decoded = OrderMetadata::decode(&map)
            .expect("decoding should succeed")
            .expect("marker should be present");

        assert_eq!(decoded, meta);
        assert_eq!(decoded.selections[0].offering.as_str(), "recA");
        assert_eq!(decoded.selections[0].quantity, 2);
        assert_eq!(decoded.selections[1].offering.as_str(), "recB");
        assert_eq!(decoded.selections[1].quantity, 1);
    }

    #[test]
    #[allow(clippy::expect_used)] // Panics: test fails if encoding fails
    fn ticket_data_stays_compact() {
        let meta = OrderMetadata::from_order(&order());
        let map = meta.encode().expect("encoding should succeed");
        assert!(map[TICKETS_KEY].chars().count() <= METADATA_TICKET_DATA_CEILING);
        // Attendee data appears once as scalars, never inside the ticket list.
        assert!(!map[TICKETS_KEY].contains("Lovelace"));
    }

    #[test]
    fn oversized_ticket_list_is_rejected_not_truncated() {
        let mut big = order();
        big.selections = (0..40)
            .map(|i| TicketSelection {
                offering: OfferingId::new(format!("recLongIdentifier{i:04}")),
                quantity: 1,
                ticket_type: "Standard Admission (Unreserved)".to_string(),
                price_ref: None,
                unit_price: Money::from_minor(1000),
            })
            .collect();
        let result = OrderMetadata::from_order(&big).encode();
        assert!(matches!(
            result,
            Err(CheckoutError::MetadataInvalid { .. })
        ));
    }

    #[test]
    #[allow(clippy::expect_used)] // Panics: test fails if decoding fails
    fn missing_marker_means_not_a_ticket_order() {
        let meta = OrderMetadata::from_order(&order());
        let mut map = meta.encode().expect("encoding should succeed");
        map.remove(MARKER_KEY);
        assert_eq!(
            OrderMetadata::decode(&map).expect("decoding should succeed"),
            None
        );
    }

    #[test]
    #[allow(clippy::expect_used)] // Panics: test fails if encoding fails
    fn marker_present_but_garbled_list_is_an_error() {
        let meta = OrderMetadata::from_order(&order());
        let mut map = meta.encode().expect("encoding should succeed");
        map.insert(TICKETS_KEY.to_string(), "not json".to_string());
        assert!(matches!(
            OrderMetadata::decode(&map),
            Err(CheckoutError::MetadataInvalid { .. })
        ));
    }

    #[test]
    #[allow(clippy::expect_used)] // Panics: test fails if the codec fails
    fn order_without_companion_round_trips() {
        let mut o = order();
        o.companion = None;
        let meta = OrderMetadata::from_order(&o);
        let map = meta.encode().expect("encoding should succeed");
        assert!(!map.contains_key("companionTicket"));
        let decoded = OrderMetadata::decode(&map)
            .expect("decoding should succeed")
            .expect("marker should be present");
        assert_eq!(decoded.companion, None);
    }
}
