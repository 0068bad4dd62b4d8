//! Checkout submission endpoint.
//!
//! `POST /api/checkout`: validates the submitted selections against live
//! Ledger counts, then creates a Payment Processor session carrying the
//! minimized order in its metadata. Validation is advisory: counts are not
//! reserved, so another buyer can take the last tickets between this check
//! and payment completion. That window is an accepted limitation of the
//! no-reservation design, documented rather than closed.
//!
//! Prices, price references, and display strings come from the Ledger rows
//! fetched here, never from the client payload.

use crate::error::ApiError;
use crate::payment::{CheckoutSessionRequest, LineItem};
use crate::server::state::AppState;
use axum::{extract::State, Json};
use box_office_core::{
    check_availability, AttendeeDetails, CheckoutError, CheckoutOrder, CompanionRequest,
    EventOffering, Money, OfferingId, OrderMetadata, TicketSelection,
};
use serde::{Deserialize, Serialize};

/// One submitted (offering, quantity) pair.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedTicket {
    /// Offering record id.
    pub event_id: String,
    /// Requested quantity.
    pub quantity: u32,
}

/// The checkout form payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Selections in display order (becomes numbering order).
    pub selected_tickets: Vec<SelectedTicket>,
    /// First name.
    pub first_name: String,
    /// Surname.
    pub surname: String,
    /// Contact email.
    pub attendee_email: String,
    /// Contact phone.
    pub phone: String,
    /// Postal code.
    #[serde(default)]
    pub postcode: String,
    /// Marketing opt-in.
    #[serde(default)]
    pub mailing_list_opt_in: bool,
    /// Whether a free companion ticket was requested.
    #[serde(default)]
    pub companion_ticket: bool,
    /// The companion-type offering for this show, identified client-side.
    #[serde(default)]
    pub companion_event_id: Option<String>,
}

/// The opaque handle the client redirects into.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    /// Session reference.
    pub session_id: String,
    /// Hosted checkout page URL.
    pub url: String,
}

/// `POST /api/checkout`
///
/// # Errors
///
/// `400` for an empty selection or missing attendee fields, `409` for
/// availability rejections (sold out, insufficient, unknown), `503` when
/// the Ledger or processor is unreachable. Any failure rejects the whole
/// request; no partial session is ever created.
pub async fn create_checkout(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let attendee = AttendeeDetails {
        first_name: request.first_name,
        surname: request.surname,
        email: request.attendee_email,
        phone: request.phone,
        postcode: request.postcode,
    };
    if let Some(field) = attendee.first_missing_field() {
        return Err(CheckoutError::MissingAttendeeField { field }.into());
    }

    let requested: Vec<&SelectedTicket> = request
        .selected_tickets
        .iter()
        .filter(|t| t.quantity > 0)
        .collect();
    if requested.is_empty() {
        return Err(CheckoutError::InvalidSelection.into());
    }

    // Validate every selection against a live snapshot before touching the
    // processor: one bad offering rejects the whole order.
    let mut selections = Vec::with_capacity(requested.len());
    let mut offerings: Vec<EventOffering> = Vec::with_capacity(requested.len());
    for ticket in &requested {
        let id = OfferingId::new(ticket.event_id.clone());
        let offering = state.ledger.get_offering(&id).await?;
        let selection = TicketSelection {
            offering: id,
            quantity: ticket.quantity,
            ticket_type: offering.ticket_type.clone(),
            price_ref: offering.price_ref.clone(),
            unit_price: offering.price,
        };
        check_availability(&offering, &selection)?;
        selections.push(selection);
        offerings.push(offering);
    }

    let companion = match (request.companion_ticket, &request.companion_event_id) {
        (true, Some(companion_id)) => {
            let id = OfferingId::new(companion_id.clone());
            let offering = state.ledger.get_offering(&id).await?;
            Some(CompanionRequest {
                offering: id,
                ticket_type: offering.ticket_type,
            })
        }
        _ => None,
    };

    // Display strings for the whole order come from the first offering; a
    // single checkout is always one show/date.
    let lead = &offerings[0];
    let order = CheckoutOrder {
        attendee,
        event_name: lead.show_name.clone(),
        date_time: lead.date_time.clone(),
        venue_address: lead.venue_address.clone(),
        currency: lead.currency.clone(),
        mailing_opt_in: request.mailing_list_opt_in,
        companion,
        selections,
    };

    let metadata = OrderMetadata::from_order(&order).encode()?;
    let line_items = line_items_for(&order);

    let handle = state
        .payment
        .create_checkout_session(CheckoutSessionRequest {
            line_items,
            customer_email: order.attendee.email.clone(),
            success_url: state.payment_config.success_url.clone(),
            cancel_url: state.payment_config.cancel_url.clone(),
            metadata,
        })
        .await?;

    tracing::info!(
        session = %handle.session,
        selections = order.selections.len(),
        companion = order.companion.is_some(),
        "checkout session created"
    );

    Ok(Json(CheckoutResponse {
        session_id: handle.session.to_string(),
        url: handle.url,
    }))
}

/// One line item per selection, by price reference when the offering has
/// one and inline otherwise, plus the zero-amount companion item when
/// requested.
fn line_items_for(order: &CheckoutOrder) -> Vec<LineItem> {
    let mut items: Vec<LineItem> = order
        .selections
        .iter()
        .map(|selection| match &selection.price_ref {
            Some(price) => LineItem::PriceRef {
                price: price.clone(),
                quantity: selection.quantity,
            },
            None => LineItem::Inline {
                name: format!("{} - {}", order.event_name, selection.ticket_type),
                unit_amount: selection.unit_price,
                currency: order.currency.clone(),
                quantity: selection.quantity,
            },
        })
        .collect();

    if let Some(companion) = &order.companion {
        items.push(LineItem::Inline {
            name: companion.ticket_type.clone(),
            unit_amount: Money::ZERO,
            currency: order.currency.clone(),
            quantity: 1,
        });
    }

    items
}
