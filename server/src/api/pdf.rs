//! PDF staging endpoints.
//!
//! The out-of-band ticket generator posts a rendered document here and
//! emails the returned id; the recipient's browser fetches the bytes within
//! the TTL window. See [`crate::pdf_store`] for the expiry semantics.

use crate::error::ApiError;
use crate::server::state::AppState;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Staging payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagePdfRequest {
    /// Base64-encoded document bytes.
    pub pdf_data: String,
}

/// Staging response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StagePdfResponse {
    /// Generated id to fetch the document with.
    pub pdf_id: String,
}

/// `POST /api/pdf`
///
/// # Errors
///
/// `400` when the payload is empty or not valid base64.
pub async fn stage_pdf(
    State(state): State<AppState>,
    Json(request): Json<StagePdfRequest>,
) -> Result<Json<StagePdfResponse>, ApiError> {
    if request.pdf_data.is_empty() {
        return Err(ApiError::bad_request("PDF data is required"));
    }

    let pdf_id = state
        .pdf_store
        .insert(&request.pdf_data, Utc::now())
        .ok_or_else(|| ApiError::bad_request("PDF data is not valid base64"))?;

    tracing::debug!(pdf_id, "staged ticket PDF");
    Ok(Json(StagePdfResponse { pdf_id }))
}

/// `GET /api/pdf/:id`
///
/// # Errors
///
/// `404` when the id is unknown or the document has expired.
pub async fn serve_pdf(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let bytes = state
        .pdf_store
        .get(&id, Utc::now())
        .ok_or_else(|| ApiError::not_found("PDF not found or expired"))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                "inline; filename=ticket.pdf".to_string(),
            ),
        ],
        bytes,
    )
        .into_response())
}
