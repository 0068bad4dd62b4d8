//! Deterministic fulfillment planning: which ticket records a completed
//! payment produces, and in what numbering.
//!
//! The plan is computed purely, before any Ledger write is dispatched, so
//! the writes themselves can fan out concurrently without racing on number
//! assignment. Numbering is per-order: an order of 2 × type A + 1 × type B
//! yields "1 of 3", "2 of 3", "3 of 3" in submitted-selection order, never
//! per-offering sequences.

use crate::metadata::OrderMetadata;
use crate::types::{
    Money, SessionRef, TicketNumber, TicketRecord, TicketStatus,
};

/// Ticket-type substrings (lowercased) that mark a selection as an
/// accessible type, enabling the free companion ticket.
const ACCESSIBLE_PATTERNS: &[&str] = &["accessible", "wheelchair"];

/// A single Ledger write the webhook handler still has to perform.
pub type PlannedTicket = TicketRecord;

/// The full set of ticket records one completed payment session must end up
/// with: Σ selection quantities numbered records, plus at most one
/// unnumbered companion.
#[derive(Clone, Debug, PartialEq)]
pub struct FulfillmentPlan {
    /// Every record the session should own, companion last.
    pub tickets: Vec<PlannedTicket>,
    /// Total numbered tickets (the "of N" denominator).
    pub total: u32,
}

impl FulfillmentPlan {
    /// Build the plan for a decoded order.
    ///
    /// `amount_paid` is the session's settled total, copied onto each
    /// numbered record; companion records always carry zero.
    ///
    /// The companion record is created only when the order both requested
    /// one and contains at least one accessible-type selection; the request
    /// flag alone is not enough, since the client-side gating can be
    /// bypassed.
    #[must_use]
    pub fn build(meta: &OrderMetadata, session: &SessionRef, amount_paid: Money) -> Self {
        let total: u32 = meta.selections.iter().map(|s| s.quantity).sum();

        let mut tickets = Vec::with_capacity(total as usize + 1);
        let mut number = 0_u32;
        for selection in &meta.selections {
            for _ in 0..selection.quantity {
                number += 1;
                tickets.push(TicketRecord {
                    offering: selection.offering.clone(),
                    event_name: meta.event_name.clone(),
                    attendee: meta.attendee.clone(),
                    session: session.clone(),
                    amount_paid,
                    ticket_type: selection.ticket_type.clone(),
                    number: Some(TicketNumber { number, total }),
                    status: TicketStatus::Valid,
                    companion: false,
                    currency: meta.currency.clone(),
                    mailing_opt_in: meta.mailing_opt_in,
                    date_time: meta.date_time.clone(),
                    venue_address: meta.venue_address.clone(),
                });
            }
        }

        if let Some(companion) = &meta.companion {
            if meta.selections.iter().any(|s| is_accessible(&s.ticket_type)) {
                tickets.push(TicketRecord {
                    offering: companion.offering.clone(),
                    event_name: meta.event_name.clone(),
                    attendee: meta.attendee.clone(),
                    session: session.clone(),
                    amount_paid: Money::ZERO,
                    ticket_type: companion.ticket_type.clone(),
                    number: None,
                    status: TicketStatus::Valid,
                    companion: true,
                    currency: meta.currency.clone(),
                    mailing_opt_in: meta.mailing_opt_in,
                    date_time: meta.date_time.clone(),
                    venue_address: meta.venue_address.clone(),
                });
            }
        }

        Self { tickets, total }
    }

    /// The planned records not yet present in the Ledger, given the records
    /// already written for this session.
    ///
    /// This is what makes redelivery safe: a first delivery sees no existing
    /// records and writes everything; a clean redelivery sees all of them
    /// and writes nothing; a retry after a partial failure writes exactly
    /// the gap. Numbered records match on their order-scoped number, the
    /// companion on its flag.
    #[must_use]
    pub fn outstanding(&self, existing: &[TicketRecord]) -> Vec<PlannedTicket> {
        self.tickets
            .iter()
            .filter(|planned| {
                !existing.iter().any(|written| match planned.number {
                    Some(n) => written.number.map(|w| w.number) == Some(n.number),
                    None => written.companion,
                })
            })
            .cloned()
            .collect()
    }

    /// Whether nothing remains to write for this session.
    #[must_use]
    pub fn is_complete(&self, existing: &[TicketRecord]) -> bool {
        self.outstanding(existing).is_empty()
    }
}

/// Case-insensitive accessible-type match on a ticket-type label.
#[must_use]
pub fn is_accessible(ticket_type: &str) -> bool {
    let label = ticket_type.to_lowercase();
    ACCESSIBLE_PATTERNS.iter().any(|p| label.contains(p))
}
