//! Fulfillment webhook endpoint.
//!
//! `POST /api/webhook`: the Payment Processor's delivery channel. The
//! handler moves through two states: unverified (raw bytes + signature
//! header) and verified (typed event). No Ledger write happens before
//! verification succeeds; a signature failure is a 400 with zero side
//! effects.
//!
//! Delivery is at-least-once, so fulfillment must be idempotent. Before
//! writing anything the handler reads the ticket records already keyed to
//! the session and writes only the planned records that are missing: a
//! clean redelivery writes nothing, a retry after a partial failure writes
//! exactly the gap. Responses follow the processor's retry contract:
//! `{received: true}` for anything handled (including skips), 5xx only when
//! redelivery should happen.

use crate::error::ApiError;
use crate::server::state::AppState;
use crate::signature::SIGNATURE_HEADER;
use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use box_office_core::{
    CheckoutError, FulfillmentPlan, OrderMetadata, SessionRef, TicketRecord, WebhookEvent,
};
use box_office_core::webhook::CompletedSession;
use chrono::Utc;
use futures::future::join_all;
use serde_json::{json, Value};

/// `POST /api/webhook`
///
/// # Errors
///
/// `400` on signature failure, `500` when fulfillment must be redelivered
/// (metadata undecodable with the marker present, or ticket writes failed).
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    // Security boundary: verify the byte-exact body before anything else.
    let header = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    state
        .signature
        .verify(&body, header, Utc::now())
        .map_err(ApiError::from)?;

    match WebhookEvent::parse(&body)? {
        WebhookEvent::Ignored { event_type } => {
            tracing::debug!(event_type, "ignoring non-fulfillment event");
            Ok(Json(json!({ "received": true })))
        }
        WebhookEvent::CheckoutCompleted(session) => fulfill(&state, session).await,
    }
}

async fn fulfill(state: &AppState, completed: CompletedSession) -> Result<Json<Value>, ApiError> {
    let session = completed.session;

    let Some(metadata) = OrderMetadata::decode(&completed.metadata)? else {
        // Other products share this endpoint; their sessions carry no
        // ticket-order marker and must be acknowledged, not retried.
        tracing::info!(session = %session, "skipping: not a ticket order");
        return Ok(Json(json!({ "received": true, "skipped": "not a ticket order" })));
    };

    let plan = FulfillmentPlan::build(&metadata, &session, completed.amount_total);
    let existing = state.ledger.tickets_for_session(&session).await?;

    // The dispatch row that triggers downstream ticket delivery is created
    // before any ticket rows, and deduplicated by its own session key: after
    // a first delivery whose ticket writes all failed, the ticket set is
    // empty but the dispatch row already exists.
    if !state.ledger.has_dispatch_record(&session).await? {
        state.ledger.create_dispatch_record(&session).await?;
    }

    let outstanding = plan.outstanding(&existing);
    if outstanding.is_empty() {
        tracing::info!(
            session = %session,
            tickets = existing.len(),
            "already fulfilled, acknowledging redelivery"
        );
        return Ok(Json(json!({ "received": true })));
    }

    write_tickets(state, &session, outstanding, plan.tickets.len()).await?;
    Ok(Json(json!({ "received": true })))
}

/// Fan the outstanding writes out concurrently. Numbering was fixed when
/// the plan was built, so completion order does not matter; all writes are
/// awaited before responding.
async fn write_tickets(
    state: &AppState,
    session: &SessionRef,
    outstanding: Vec<TicketRecord>,
    planned_total: usize,
) -> Result<(), ApiError> {
    let attempted = outstanding.len();
    let writes = outstanding
        .iter()
        .map(|ticket| state.ledger.create_ticket(ticket));
    let failed = join_all(writes)
        .await
        .into_iter()
        .filter(|result| result.is_err())
        .count();

    if failed > 0 {
        // Surface as a 5xx so the processor redelivers; the idempotent diff
        // above makes the retry write only what is still missing.
        return Err(CheckoutError::PartialFulfillmentFailure {
            failed,
            total: attempted,
        }
        .into());
    }

    tracing::info!(
        session = %session,
        written = attempted,
        planned = planned_total,
        "ticket records created"
    );
    Ok(())
}
