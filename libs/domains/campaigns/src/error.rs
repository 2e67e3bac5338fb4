//! Error types for the campaigns domain.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_helpers::ErrorResponse;
use stream_worker::StreamError;
use thiserror::Error;

/// Result type for campaign operations.
pub type CampaignResult<T> = Result<T, CampaignError>;

/// Errors that can occur in the campaigns domain.
#[derive(Debug, Error)]
pub enum CampaignError {
    /// No recipient survived validation.
    #[error("No valid email address in the list")]
    EmptyRecipients,

    /// Campaign subject is blank.
    #[error("Email subject is required")]
    MissingSubject,

    /// Campaign body is blank.
    #[error("Email body is required")]
    MissingBody,

    /// Recipient failed syntactic validation.
    #[error("Invalid recipient address: {0}")]
    InvalidRecipient(String),

    /// Mail transport setup failure.
    #[error("Transport error: {0}")]
    TransportError(String),

    /// Broker or job-state store failure.
    #[error("Queue error: {0}")]
    QueueError(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StreamError> for CampaignError {
    fn from(err: StreamError) -> Self {
        CampaignError::QueueError(err.to_string())
    }
}

impl From<serde_json::Error> for CampaignError {
    fn from(err: serde_json::Error) -> Self {
        CampaignError::Internal(format!("JSON serialization error: {}", err))
    }
}

impl IntoResponse for CampaignError {
    fn into_response(self) -> Response {
        match self {
            CampaignError::EmptyRecipients
            | CampaignError::MissingSubject
            | CampaignError::MissingBody
            | CampaignError::InvalidRecipient(_) => {
                tracing::info!("Rejected campaign request: {}", self);
                let body = Json(ErrorResponse::new("BadRequest", self.to_string()));
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            CampaignError::TransportError(_)
            | CampaignError::QueueError(_)
            | CampaignError::Internal(_) => {
                // Infrastructure details stay in the logs
                tracing::error!("Request handling failed: {}", self);
                let body = Json(ErrorResponse::new(
                    "InternalServerError",
                    "Failed to process the request",
                ));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_errors_map_to_bad_request() {
        let response = CampaignError::EmptyRecipients.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_queue_errors_map_to_internal_server_error() {
        let response = CampaignError::QueueError("broker down".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
