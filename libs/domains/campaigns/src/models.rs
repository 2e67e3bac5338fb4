//! Data models for the campaigns domain.

use crate::error::{CampaignError, CampaignResult};
use crate::validator;
use ::validator::Validate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stream_worker::{StreamJob, TaskStatus};
use utoipa::ToSchema;
use uuid::Uuid;

// ============================================================================
// Domain entities
// ============================================================================

/// Delivery status of a single message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Pending,
    Sent,
    Failed,
}

/// A single outbound email message.
///
/// Construction fails fast: the recipient must pass the validator and
/// subject/body must be non-blank. Mutated only by the delivery attempt
/// outcome; never persisted beyond the job lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub from_email: Option<String>,
    pub status: MessageStatus,
}

impl EmailMessage {
    pub fn new(
        to: String,
        subject: String,
        body: String,
        from_email: Option<String>,
    ) -> CampaignResult<Self> {
        // Defensive double-check: the normal path pre-filters recipients,
        // but the contract must hold when invoked directly.
        if !validator::is_valid(&to) {
            return Err(CampaignError::InvalidRecipient(to));
        }
        if subject.trim().is_empty() {
            return Err(CampaignError::MissingSubject);
        }
        if body.trim().is_empty() {
            return Err(CampaignError::MissingBody);
        }

        Ok(Self {
            to,
            subject,
            body,
            from_email,
            status: MessageStatus::Pending,
        })
    }

    pub fn mark_sent(&mut self) {
        self.status = MessageStatus::Sent;
    }

    pub fn mark_failed(&mut self) {
        self.status = MessageStatus::Failed;
    }
}

/// A batch campaign: shared subject/body/sender over a recipient list.
///
/// Ephemeral - exists only during request handling to derive one delivery
/// job per recipient, then discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailCampaign {
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
    pub from_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl EmailCampaign {
    pub fn new(
        recipients: Vec<String>,
        subject: String,
        body: String,
        from_email: Option<String>,
    ) -> CampaignResult<Self> {
        if recipients.is_empty() {
            return Err(CampaignError::EmptyRecipients);
        }
        if subject.trim().is_empty() {
            return Err(CampaignError::MissingSubject);
        }
        if body.trim().is_empty() {
            return Err(CampaignError::MissingBody);
        }

        Ok(Self {
            recipients,
            subject,
            body,
            from_email,
            created_at: Utc::now(),
        })
    }
}

/// A queued delivery job: one email send attempt sequence for one
/// recipient. The `id` is the opaque task handle returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryJob {
    pub id: Uuid,
    pub to_email: String,
    pub subject: String,
    pub body: String,
    pub from_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl DeliveryJob {
    /// Derive a job for one recipient of a campaign.
    pub fn for_recipient(campaign: &EmailCampaign, recipient: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            to_email: recipient.to_string(),
            subject: campaign.subject.clone(),
            body: campaign.body.clone(),
            from_email: campaign.from_email.clone(),
            created_at: Utc::now(),
        }
    }
}

impl StreamJob for DeliveryJob {
    fn job_id(&self) -> String {
        self.id.to_string()
    }
}

// ============================================================================
// API schemas
// ============================================================================

/// Request body for submitting a campaign.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SendEmailsRequest {
    /// Recipient email addresses.
    #[validate(length(min = 1, message = "at least one recipient is required"))]
    pub emails: Vec<String>,
    /// Email subject line.
    #[validate(length(min = 1, message = "subject must not be blank"))]
    pub subject: String,
    /// Plain-text email body.
    #[validate(length(min = 1, message = "body must not be blank"))]
    pub body: String,
    /// Optional sender address; the relay default applies when absent.
    pub from_email: Option<String>,
}

/// Response for an accepted campaign submission.
#[derive(Debug, Serialize, ToSchema)]
pub struct SendEmailsResponse {
    pub message: String,
    /// One task id per accepted recipient; the handle for status queries.
    pub task_ids: Vec<String>,
    /// Number of recipients accepted after filtering.
    pub total_emails: usize,
}

/// Response for a task-status query.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TaskStatusResponse {
    pub task_id: String,
    /// PENDING, STARTED, RETRY, SUCCESS or FAILURE.
    pub status: String,
    /// Result payload, present only on SUCCESS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Structured error payload, present only on FAILURE.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<serde_json::Value>,
}

impl From<TaskStatus> for TaskStatusResponse {
    fn from(status: TaskStatus) -> Self {
        Self {
            task_id: status.task_id,
            status: status.state.to_string(),
            result: status.result,
            error: status.error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stream_worker::TaskState;

    #[test]
    fn test_message_requires_valid_recipient() {
        let result = EmailMessage::new(
            "not-an-address".to_string(),
            "Subject".to_string(),
            "Body".to_string(),
            None,
        );
        assert!(matches!(result, Err(CampaignError::InvalidRecipient(_))));
    }

    #[test]
    fn test_message_requires_subject_and_body() {
        let missing_subject = EmailMessage::new(
            "a@b.com".to_string(),
            "  ".to_string(),
            "Body".to_string(),
            None,
        );
        assert!(matches!(missing_subject, Err(CampaignError::MissingSubject)));

        let missing_body =
            EmailMessage::new("a@b.com".to_string(), "Subject".to_string(), String::new(), None);
        assert!(matches!(missing_body, Err(CampaignError::MissingBody)));
    }

    #[test]
    fn test_message_starts_pending_and_tracks_outcome() {
        let mut message = EmailMessage::new(
            "a@b.com".to_string(),
            "Subject".to_string(),
            "Body".to_string(),
            None,
        )
        .unwrap();
        assert_eq!(message.status, MessageStatus::Pending);

        message.mark_sent();
        assert_eq!(message.status, MessageStatus::Sent);
    }

    #[test]
    fn test_campaign_rejects_empty_recipients() {
        let result = EmailCampaign::new(vec![], "Subject".to_string(), "Body".to_string(), None);
        assert!(matches!(result, Err(CampaignError::EmptyRecipients)));
    }

    #[test]
    fn test_job_derives_campaign_fields() {
        let campaign = EmailCampaign::new(
            vec!["a@b.com".to_string(), "c@d.org".to_string()],
            "Subject".to_string(),
            "Body".to_string(),
            Some("sender@corp.example".to_string()),
        )
        .unwrap();

        let job = DeliveryJob::for_recipient(&campaign, "a@b.com");
        assert_eq!(job.to_email, "a@b.com");
        assert_eq!(job.subject, "Subject");
        assert_eq!(job.from_email.as_deref(), Some("sender@corp.example"));
        assert_eq!(job.job_id(), job.id.to_string());
    }

    #[test]
    fn test_jobs_get_distinct_ids() {
        let campaign = EmailCampaign::new(
            vec!["a@b.com".to_string()],
            "S".to_string(),
            "B".to_string(),
            None,
        )
        .unwrap();

        let first = DeliveryJob::for_recipient(&campaign, "a@b.com");
        let second = DeliveryJob::for_recipient(&campaign, "a@b.com");
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_task_status_response_from_store_record() {
        let status = TaskStatus {
            task_id: "abc".to_string(),
            state: TaskState::Success,
            result: Some(serde_json::json!({"status": "sent"})),
            error: None,
        };

        let response = TaskStatusResponse::from(status);
        assert_eq!(response.status, "SUCCESS");
        assert!(response.result.is_some());
        assert!(response.error.is_none());
    }
}
