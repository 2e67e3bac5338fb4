//! Health check handlers for stream workers.
//!
//! Reusable Axum handlers for worker probe ports:
//! - Liveness (`/health`)
//! - Readiness (`/ready`, checks broker connectivity)
//! - Stream monitoring (`/stream/info`)

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use redis::aio::ConnectionManager;
use serde::Serialize;
use serde_json::{json, Value};

use crate::connection::ping;

/// Shared state for worker health endpoints.
#[derive(Clone)]
pub struct HealthState {
    /// Redis connection for readiness checks.
    pub redis: ConnectionManager,
    /// Application name.
    pub app_name: String,
    /// Application version.
    pub app_version: String,
    /// Stream name for monitoring.
    pub stream_name: String,
    /// DLQ stream name.
    pub dlq_stream: String,
}

impl HealthState {
    pub fn new(
        redis: ConnectionManager,
        app_name: impl Into<String>,
        app_version: impl Into<String>,
        stream_name: impl Into<String>,
        dlq_stream: impl Into<String>,
    ) -> Self {
        Self {
            redis,
            app_name: app_name.into(),
            app_version: app_version.into(),
            stream_name: stream_name.into(),
            dlq_stream: dlq_stream.into(),
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    name: String,
    version: String,
}

/// Liveness probe: always OK while the process is responsive.
async fn health_handler(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        name: state.app_name,
        version: state.app_version,
    })
}

/// Readiness probe: verifies broker connectivity with a PING.
async fn ready_handler(State(state): State<HealthState>) -> impl IntoResponse {
    match ping(&state.redis).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({"status": "ready", "checks": {"redis": "ok"}})),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"status": "not_ready", "checks": {"redis": e.to_string()}})),
        ),
    }
}

/// Stream lengths for the job stream and its DLQ.
async fn stream_info_handler(State(state): State<HealthState>) -> impl IntoResponse {
    let mut conn = state.redis.clone();

    let stream_len: Result<i64, _> = redis::cmd("XLEN")
        .arg(&state.stream_name)
        .query_async(&mut conn)
        .await;
    let dlq_len: Result<i64, _> = redis::cmd("XLEN")
        .arg(&state.dlq_stream)
        .query_async(&mut conn)
        .await;

    match (stream_len, dlq_len) {
        (Ok(stream), Ok(dlq)) => (
            StatusCode::OK,
            Json(json!({
                "stream": state.stream_name,
                "length": stream,
                "dlq": state.dlq_stream,
                "dlq_length": dlq,
            })),
        ),
        (stream, dlq) => {
            let detail: Value = json!({
                "stream": stream.err().map(|e| e.to_string()),
                "dlq": dlq.err().map(|e| e.to_string()),
            });
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"status": "unavailable", "errors": detail})),
            )
        }
    }
}

/// Router serving worker probe endpoints.
pub fn worker_router(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/stream/info", get(stream_info_handler))
        .with_state(state)
}
