//! Campaign service: fan-out enqueue and status lookup.

use crate::error::{CampaignError, CampaignResult};
use crate::models::{
    DeliveryJob, EmailCampaign, SendEmailsRequest, SendEmailsResponse, TaskStatusResponse,
};
use crate::validator::filter_valid;
use std::sync::Arc;
use stream_worker::{StatusStore, StreamJob, StreamProducer, TaskState};
use tracing::info;

/// Service for submitting campaigns and querying delivery status.
///
/// Enqueuing is fire-and-forget: one delivery job per valid recipient is
/// handed to the broker and the assigned task ids are returned
/// immediately. Delivery outcomes only become visible through the
/// job-state store.
pub struct CampaignService<S: StatusStore> {
    producer: StreamProducer,
    status: Arc<S>,
}

impl<S: StatusStore> CampaignService<S> {
    /// Create a new campaign service.
    pub fn new(producer: StreamProducer, status: S) -> Self {
        Self {
            producer,
            status: Arc::new(status),
        }
    }

    /// Validate, filter and enqueue a campaign.
    ///
    /// All-or-nothing gate: if no recipient survives filtering, nothing is
    /// enqueued and the caller gets an input error. Individually invalid
    /// addresses are dropped silently (logged server-side only).
    pub async fn submit_campaign(
        &self,
        request: SendEmailsRequest,
    ) -> CampaignResult<SendEmailsResponse> {
        let (valid, _invalid) = filter_valid(&request.emails);

        if valid.is_empty() {
            return Err(CampaignError::EmptyRecipients);
        }

        let campaign = EmailCampaign::new(valid, request.subject, request.body, request.from_email)?;

        let mut task_ids = Vec::with_capacity(campaign.recipients.len());
        for recipient in &campaign.recipients {
            let job = DeliveryJob::for_recipient(&campaign, recipient);

            // Register PENDING before the broker can hand the job to a
            // worker, so STARTED never races an unwritten record
            self.status.set_state(&job.job_id(), TaskState::Pending).await?;
            let stream_id = self.producer.send(&job).await?;

            info!(
                job_id = %job.id,
                to = %recipient,
                stream_id = %stream_id,
                "Queued delivery job"
            );
            task_ids.push(job.id.to_string());
        }

        info!(total = task_ids.len(), "Campaign accepted");

        Ok(SendEmailsResponse {
            message: "Delivery jobs queued".to_string(),
            total_emails: task_ids.len(),
            task_ids,
        })
    }

    /// Look up the current status of a delivery job.
    ///
    /// Unknown or malformed ids read back as PENDING; the store does not
    /// distinguish them from jobs that are queued but not yet visible.
    pub async fn task_status(&self, task_id: &str) -> CampaignResult<TaskStatusResponse> {
        let status = self.status.fetch(task_id).await?;
        Ok(status.into())
    }
}
