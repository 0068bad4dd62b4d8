//! Catalog listing endpoint.
//!
//! `GET /api/events`: the currently-onsale offerings, shaped for the
//! selector UI. Rows without a processor price reference are administrative
//! (companion rows, placeholders) and are excluded: they cannot be bought
//! directly.

use crate::error::ApiError;
use crate::ledger::CatalogOffering;
use crate::server::state::AppState;
use axum::{extract::State, Json};
use serde::Serialize;

/// One sellable offering as the selector UI consumes it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventProjection {
    /// Ledger record identifier.
    pub id: String,
    /// Show name.
    pub name: String,
    /// Display name shown to buyers.
    pub display_name: String,
    /// Show description.
    pub show_description: String,
    /// Show image URL.
    pub show_image: String,
    /// Ticket-type label.
    pub ticket_type: String,
    /// Combined type + price display label.
    pub ticket_type_price: String,
    /// Unit price in major units.
    pub price: f64,
    /// ISO currency code.
    pub currency: String,
    /// Currency symbol for display.
    pub currency_symbol: String,
    /// Remaining sellable count; 0 also covers "unknown" for display, the
    /// authoritative check happens at checkout.
    pub tickets_remaining: u32,
    /// Per-purchase maximum quantity.
    pub max_tickets: u32,
    /// Display date/time string.
    pub date_time: String,
    /// "Doors + performance" display string.
    pub doors_performance: String,
    /// Display venue string.
    pub venue_address: String,
    /// Booking fee in major units.
    pub booking_fee: f64,
    /// Booking fee explanation.
    pub booking_fee_message: String,
    /// Unit price + booking fee.
    pub total_cost: f64,
}

/// Response wrapper.
#[derive(Debug, Serialize)]
pub struct ListEventsResponse {
    /// Sellable offerings.
    pub events: Vec<EventProjection>,
}

/// `GET /api/events`
///
/// # Errors
///
/// `503` when the Ledger cannot be reached (retryable from the client's
/// point of view).
pub async fn list_events(
    State(state): State<AppState>,
) -> Result<Json<ListEventsResponse>, ApiError> {
    let offerings = state.ledger.list_offerings().await?;

    let events = offerings
        .into_iter()
        .filter(|entry| entry.offering.price_ref.is_some())
        .map(project)
        .collect();

    Ok(Json(ListEventsResponse { events }))
}

fn project(entry: CatalogOffering) -> EventProjection {
    let offering = entry.offering;
    EventProjection {
        id: offering.id.to_string(),
        name: offering.show_name,
        display_name: offering.display_name,
        show_description: entry.description,
        show_image: entry.image_url,
        ticket_type: offering.ticket_type,
        ticket_type_price: entry.ticket_type_price,
        price: offering.price.as_major(),
        currency: offering.currency,
        currency_symbol: entry.currency_symbol,
        tickets_remaining: offering.remaining.unwrap_or(0),
        max_tickets: offering.max_per_purchase,
        date_time: offering.date_time,
        doors_performance: entry.doors_performance,
        venue_address: offering.venue_address,
        booking_fee: entry.booking_fee,
        booking_fee_message: entry.booking_fee_message,
        total_cost: entry.total_cost,
    }
}
