//! Liveness probe.

use axum::Json;
use serde_json::{json, Value};

/// `GET /health`: process is up and serving.
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
