//! Router configuration for the Box Office server.

use super::health::health_check;
use super::state::AppState;
use crate::api::{check_ticket, checkout, events, pdf, webhook};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
///
/// The webhook route takes the raw request body (`Bytes`): nothing may parse
/// it before signature verification. CORS on the API routes is wide open:
/// the checkout form is embedded on arbitrary site-builder pages, so any
/// origin with the full method set is intentional.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/events", get(events::list_events))
        .route("/checkout", post(checkout::create_checkout))
        .route("/webhook", post(webhook::handle_webhook))
        .route("/check-ticket", post(check_ticket::check_ticket))
        .route("/pdf", post(pdf::stage_pdf))
        .route("/pdf/:id", get(pdf::serve_pdf))
        .layer(cors);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
