//! HTTP handlers for the campaigns domain.
//!
//! Wired into an app router by the API service; paths here are relative
//! to the mount point (`/api/v1`).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use axum_helpers::{ErrorResponse, ValidatedJson};
use serde_json::json;
use std::sync::Arc;
use stream_worker::StatusStore;
use utoipa::OpenApi;

use crate::error::CampaignResult;
use crate::models::{SendEmailsRequest, SendEmailsResponse, TaskStatusResponse};
use crate::service::CampaignService;

/// Service name reported by the health endpoint.
const SERVICE_NAME: &str = "bulkmailer";

/// OpenAPI documentation for the campaigns API
#[derive(OpenApi)]
#[openapi(
    paths(send_emails, task_status, health_check),
    components(schemas(SendEmailsRequest, SendEmailsResponse, TaskStatusResponse, ErrorResponse)),
    tags(
        (name = "emails", description = "Bulk email submission and delivery tracking")
    )
)]
pub struct ApiDoc;

/// Create the campaigns router with all HTTP endpoints
pub fn router<S: StatusStore + 'static>(service: CampaignService<S>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/send-emails", post(send_emails))
        .route("/task-status/{task_id}", get(task_status))
        .route("/health", get(health_check))
        .with_state(shared_service)
}

/// Submit a campaign: one background delivery job per valid recipient
#[utoipa::path(
    post,
    path = "/send-emails",
    tag = "emails",
    request_body = SendEmailsRequest,
    responses(
        (status = 202, description = "Delivery jobs queued", body = SendEmailsResponse),
        (status = 400, description = "No valid recipient in the list", body = ErrorResponse),
        (status = 422, description = "Request body failed schema validation", body = ErrorResponse),
        (status = 500, description = "Enqueueing failed", body = ErrorResponse)
    )
)]
async fn send_emails<S: StatusStore + 'static>(
    State(service): State<Arc<CampaignService<S>>>,
    ValidatedJson(request): ValidatedJson<SendEmailsRequest>,
) -> CampaignResult<impl IntoResponse> {
    let response = service.submit_campaign(request).await?;
    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// Query the delivery status of a previously enqueued job
#[utoipa::path(
    get,
    path = "/task-status/{task_id}",
    tag = "emails",
    params(
        ("task_id" = String, Path, description = "Task id returned by send-emails")
    ),
    responses(
        (status = 200, description = "Current job status", body = TaskStatusResponse),
        (status = 500, description = "Status lookup failed", body = ErrorResponse)
    )
)]
async fn task_status<S: StatusStore + 'static>(
    State(service): State<Arc<CampaignService<S>>>,
    Path(task_id): Path<String>,
) -> CampaignResult<Json<TaskStatusResponse>> {
    let status = service.task_status(&task_id).await?;
    Ok(Json(status))
}

/// Liveness probe; checks no dependencies
#[utoipa::path(
    get,
    path = "/health",
    tag = "emails",
    responses(
        (status = 200, description = "Service is up")
    )
)]
async fn health_check() -> impl IntoResponse {
    Json(json!({"status": "healthy", "service": SERVICE_NAME}))
}
