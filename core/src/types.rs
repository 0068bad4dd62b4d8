//! Domain types for the Box Office checkout pipeline.
//!
//! Value objects and entities shared between checkout-session creation and
//! webhook fulfillment. Identifiers are opaque strings assigned by the Ledger
//! and the Payment Processor; they are newtyped so the two cannot be mixed up.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Identifiers
// ============================================================================

/// Opaque Ledger-assigned identifier for an [`EventOffering`] record.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OfferingId(String);

impl OfferingId {
    /// Wrap a raw Ledger record identifier.
    #[must_use]
    pub const fn new(id: String) -> Self {
        Self(id)
    }

    /// The raw identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OfferingId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for OfferingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque Payment Processor checkout-session reference.
///
/// This is the idempotency key for fulfillment: the set of ticket records
/// written for one payment is keyed by this value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionRef(String);

impl SessionRef {
    /// Wrap a raw session identifier.
    #[must_use]
    pub const fn new(id: String) -> Self {
        Self(id)
    }

    /// The raw identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionRef {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for SessionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Money Value Object (minor units, to avoid floating point errors)
// ============================================================================

/// A monetary amount in minor currency units (pence, cents).
///
/// The currency code travels separately on the order; `Money` is just the
/// magnitude. Companion tickets carry [`Money::ZERO`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// Zero amount (free tickets).
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from minor units.
    #[must_use]
    pub const fn from_minor(minor: u64) -> Self {
        Self(minor)
    }

    /// Creates a `Money` value from a major-unit decimal (e.g. `12.50`),
    /// rounding to the nearest minor unit. Negative inputs clamp to zero:
    /// the Ledger never stores negative prices, so a negative here is a
    /// malformed row, not a refund.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_major(major: f64) -> Self {
        if major.is_finite() && major > 0.0 {
            Self((major * 100.0).round() as u64)
        } else {
            Self::ZERO
        }
    }

    /// The amount in minor units.
    #[must_use]
    pub const fn as_minor(&self) -> u64 {
        self.0
    }

    /// The amount as a major-unit decimal, for Ledger fields that store
    /// pounds/euros rather than pence/cents.
    #[must_use]
    pub fn as_major(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let minor = self.0 as f64;
        minor / 100.0
    }

    /// Whether this is a zero amount.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// One sellable (show, date/time, ticket-type) combination as read from the
/// Ledger's Offerings collection.
///
/// `remaining` is a point-in-time snapshot: it is authoritative only at the
/// Ledger and is never decremented by this system; the decrement happens
/// Ledger-side when ticket records are created. `None` means the Ledger field
/// was missing or unparseable, which is distinct from a count of zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventOffering {
    /// Ledger record identifier.
    pub id: OfferingId,
    /// Show name (groups offerings for the same production).
    pub show_name: String,
    /// Human-readable name shown to buyers.
    pub display_name: String,
    /// Ticket-type label, e.g. "Standard", "Accessible / Wheelchair",
    /// "ACCESS COMPANION".
    pub ticket_type: String,
    /// Unit price.
    pub price: Money,
    /// ISO currency code, e.g. "GBP".
    pub currency: String,
    /// Remaining sellable count at read time; `None` if unknown.
    pub remaining: Option<u32>,
    /// Per-purchase maximum quantity.
    pub max_per_purchase: u32,
    /// Pre-registered Payment Processor price reference, if the offering has
    /// one. Offerings without one are not sellable through the catalog but
    /// may still be sold with inline price data (companion rows).
    pub price_ref: Option<String>,
    /// Display date/time string carried through to the ticket record.
    pub date_time: String,
    /// Display venue string carried through to the ticket record.
    pub venue_address: String,
}

// ============================================================================
// Checkout
// ============================================================================

/// A client-requested (offering, quantity) pair within a single checkout.
///
/// Ephemeral: lives only for the duration of one checkout request, then is
/// minimized into session metadata by [`crate::metadata::OrderMetadata`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TicketSelection {
    /// The offering being purchased.
    pub offering: OfferingId,
    /// Requested quantity; must be positive to be meaningful.
    pub quantity: u32,
    /// Ticket-type label copied from the offering (drives the companion
    /// accessible-type check at fulfillment).
    pub ticket_type: String,
    /// Pre-registered processor price reference, when available.
    pub price_ref: Option<String>,
    /// Unit price, used for inline line items when `price_ref` is absent.
    pub unit_price: Money,
}

/// Attendee identity captured by the checkout form.
///
/// Copied onto every ticket record (not referenced) so attendee data
/// survives later edits to the offering rows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttendeeDetails {
    /// First name.
    pub first_name: String,
    /// Surname.
    pub surname: String,
    /// Contact email; also prefilled into the processor checkout page.
    pub email: String,
    /// Contact phone number.
    pub phone: String,
    /// Postal code.
    pub postcode: String,
}

impl AttendeeDetails {
    /// Returns the name of the first required field that is empty, if any.
    #[must_use]
    pub fn first_missing_field(&self) -> Option<&'static str> {
        [
            ("firstName", &self.first_name),
            ("surname", &self.surname),
            ("attendeeEmail", &self.email),
            ("phone", &self.phone),
            ("postcode", &self.postcode),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}

/// A requested free companion ticket, identified client-side as the
/// companion-type offering belonging to the same show.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompanionRequest {
    /// The companion-type offering to issue the free ticket against.
    pub offering: OfferingId,
    /// Its ticket-type label, e.g. "ACCESS COMPANION".
    pub ticket_type: String,
}

/// The unit of a single payment attempt.
///
/// Created when the user submits the form; serialized into the processor's
/// session metadata; reconstructed by the webhook. The underlying session
/// record persists at the Payment Processor as an audit trail.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckoutOrder {
    /// Ordered ticket selections, in submitted order (numbering order).
    pub selections: Vec<TicketSelection>,
    /// Attendee identity.
    pub attendee: AttendeeDetails,
    /// Show/event display name (also the ticket-order marker in metadata).
    pub event_name: String,
    /// Display date/time string.
    pub date_time: String,
    /// Display venue string.
    pub venue_address: String,
    /// ISO currency code for the whole order.
    pub currency: String,
    /// Marketing opt-in flag.
    pub mailing_opt_in: bool,
    /// Companion ticket request, if any.
    pub companion: Option<CompanionRequest>,
}

// ============================================================================
// Tickets
// ============================================================================

/// Position of a ticket within its order, rendered as `"2 of 3"`.
///
/// Companion tickets are unnumbered and carry no `TicketNumber` at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketNumber {
    /// 1-based position across the entire order.
    pub number: u32,
    /// Total numbered tickets in the order.
    pub total: u32,
}

impl fmt::Display for TicketNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {}", self.number, self.total)
    }
}

/// Lifecycle status of a ticket record.
///
/// Only `Valid` is ever written by this system; the transition to
/// `CheckedIn` belongs to the external check-in collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketStatus {
    /// Issued and not yet used.
    Valid,
    /// Scanned at the door.
    CheckedIn,
}

/// One physical/deliverable ticket, as written to the Ledger's Tickets
/// collection during webhook fulfillment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TicketRecord {
    /// Owning offering.
    pub offering: OfferingId,
    /// Show/event display name.
    pub event_name: String,
    /// Attendee identity (copied, not referenced).
    pub attendee: AttendeeDetails,
    /// Payment session this record was fulfilled from.
    pub session: SessionRef,
    /// Amount paid; zero for companion tickets.
    pub amount_paid: Money,
    /// Ticket-type label.
    pub ticket_type: String,
    /// Order-scoped number, absent for companion tickets.
    pub number: Option<TicketNumber>,
    /// Lifecycle status.
    pub status: TicketStatus,
    /// Whether this is a free companion ticket.
    pub companion: bool,
    /// ISO currency code.
    pub currency: String,
    /// Marketing opt-in copied from the order.
    pub mailing_opt_in: bool,
    /// Display date/time string.
    pub date_time: String,
    /// Display venue string.
    pub venue_address: String,
}
