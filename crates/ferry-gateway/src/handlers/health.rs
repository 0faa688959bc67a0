use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

/// Health check endpoint. Answers without contacting the dispatcher.
pub async fn health() -> Json<Value> {
    Json(serde_json::json!({ "ok": true }))
}

/// Plain-text 404 for unmatched methods and paths.
pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "not found")
}
