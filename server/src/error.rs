//! HTTP error bridge.
//!
//! Maps the domain's [`CheckoutError`] taxonomy onto HTTP statuses and the
//! `{"error": "..."}` body shape the client UI consumes, via Axum's
//! `IntoResponse`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use box_office_core::CheckoutError;
use serde::Serialize;
use std::fmt;

/// Application error type for HTTP handlers.
///
/// Wraps a status, a user-facing message, and an optional internal source
/// kept out of the response body but logged for server errors.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    source: Option<anyhow::Error>,
}

impl ApiError {
    /// Create an error with an explicit status.
    #[must_use]
    pub const fn new(status: StatusCode, message: String) -> Self {
        Self {
            status,
            message,
            source: None,
        }
    }

    /// Attach an internal source error for logging.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message.into())
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message.into())
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message.into())
    }

    /// The mapped status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.status, self.message)
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body: the `{error}` shape the client UI expects.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(status = %self.status, message = %self.message, error = %source, "request failed");
            } else {
                tracing::error!(status = %self.status, message = %self.message, "request failed");
            }
        } else {
            tracing::warn!(status = %self.status, message = %self.message, "request rejected");
        }

        let body = ErrorBody {
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        let status = match &err {
            CheckoutError::UpstreamUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            CheckoutError::SoldOut { .. }
            | CheckoutError::InsufficientAvailability { .. }
            | CheckoutError::AvailabilityUnknown { .. } => StatusCode::CONFLICT,
            CheckoutError::InvalidSelection
            | CheckoutError::MissingAttendeeField { .. }
            | CheckoutError::SignatureInvalid { .. } => StatusCode::BAD_REQUEST,
            CheckoutError::PartialFulfillmentFailure { .. }
            | CheckoutError::MetadataInvalid { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}
