//! Readiness endpoint

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use redis::aio::ConnectionManager;
use serde_json::json;

/// Create a readiness router backed by the result-store connection
pub fn ready_router(redis: ConnectionManager) -> Router {
    Router::new()
        .route("/ready", get(readiness_check))
        .with_state(redis)
}

/// Readiness check - verifies broker/result-store connectivity
async fn readiness_check(State(redis): State<ConnectionManager>) -> impl IntoResponse {
    match stream_worker::ping(&redis).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({"status": "ready", "redis": "connected"})),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"status": "not_ready", "redis": e.to_string()})),
        ),
    }
}
