//! Check-in lookup endpoint.
//!
//! `POST /api/check-ticket`: the boundary with the external check-in
//! collaborator's scanner UI: look up a scanned ticket record and report
//! whether it belongs to the selected event and whether it was already
//! used. The status mutation itself (marking checked-in) is the
//! collaborator's own write, not performed here.

use crate::error::ApiError;
use crate::server::state::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

/// Scanner payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckTicketRequest {
    /// Scanned ticket record id.
    pub record_id: String,
    /// The event the scanner is admitting for.
    #[serde(default)]
    pub selected_event_id: Option<String>,
}

/// Ticket state as the scanner displays it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketView {
    /// Attendee display name.
    pub name: String,
    /// Linked offering identifiers.
    pub event: Vec<String>,
    /// Whether the ticket has been scanned already.
    pub checked_in: bool,
    /// Check-in timestamp, if scanned.
    pub checkin_time: Option<String>,
    /// Who scanned it, if scanned.
    pub checkin_by: Option<String>,
    /// Whether the ticket belongs to the selected event.
    pub is_correct_event: bool,
}

/// Response wrapper.
#[derive(Debug, Serialize)]
pub struct CheckTicketResponse {
    /// Lookup succeeded.
    pub success: bool,
    /// The ticket state.
    pub ticket: TicketView,
}

/// `POST /api/check-ticket`
///
/// # Errors
///
/// `400` for a blank record id, `404` for an unknown ticket, `503` when the
/// Ledger is unreachable.
pub async fn check_ticket(
    State(state): State<AppState>,
    Json(request): Json<CheckTicketRequest>,
) -> Result<Json<CheckTicketResponse>, ApiError> {
    if request.record_id.trim().is_empty() {
        return Err(ApiError::bad_request("Record ID is required"));
    }

    let lookup = state
        .ledger
        .get_ticket(&request.record_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Ticket not found"))?;

    let is_correct_event = request
        .selected_event_id
        .as_ref()
        .is_some_and(|selected| lookup.event_ids.iter().any(|id| id == selected));

    Ok(Json(CheckTicketResponse {
        success: true,
        ticket: TicketView {
            name: lookup.name,
            event: lookup.event_ids,
            checked_in: lookup.checked_in,
            checkin_time: lookup.checkin_time,
            checkin_by: lookup.checkin_by,
            is_correct_event,
        },
    }))
}
