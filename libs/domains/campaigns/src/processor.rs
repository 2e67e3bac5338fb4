//! Delivery processor for the stream worker.
//!
//! `DeliveryProcessor` implements `StreamProcessor<DeliveryJob>`: one
//! attempt builds the message and pushes it through the mail transport.
//! A failed transport send is transient (the runner retries it); a failed
//! message construction is permanent (bad input never fixes itself).

use crate::models::{DeliveryJob, EmailMessage};
use crate::transport::{MailTransport, SendOutcome};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use stream_worker::{StreamError, StreamProcessor};
use tracing::info;

/// Processes delivery jobs by sending one email per job.
pub struct DeliveryProcessor<T: MailTransport> {
    transport: Arc<T>,
}

impl<T: MailTransport + 'static> DeliveryProcessor<T> {
    /// Create a new delivery processor.
    pub fn new(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    /// Create a processor sharing an existing transport.
    pub fn with_arc(transport: Arc<T>) -> Self {
        Self { transport }
    }

    /// Get a reference to the mail transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

#[async_trait]
impl<T: MailTransport + 'static> StreamProcessor<DeliveryJob> for DeliveryProcessor<T> {
    async fn process(&self, job: &DeliveryJob) -> Result<Value, StreamError> {
        info!(
            job_id = %job.id,
            to = %job.to_email,
            transport = %self.transport.name(),
            "Processing delivery job"
        );

        let mut message = EmailMessage::new(
            job.to_email.clone(),
            job.subject.clone(),
            job.body.clone(),
            job.from_email.clone(),
        )
        .map_err(|e| StreamError::permanent(e.to_string()))?;

        match self.transport.send(&message).await {
            SendOutcome::Accepted => {
                message.mark_sent();
                info!(job_id = %job.id, to = %job.to_email, "Email sent");
                Ok(json!({
                    "status": "sent",
                    "recipient": job.to_email,
                    "job_id": job.id,
                }))
            }
            SendOutcome::Failed { reason } => {
                message.mark_failed();
                Err(StreamError::transient(reason))
            }
        }
    }

    fn name(&self) -> &'static str {
        "DeliveryProcessor"
    }

    fn failure_payload(&self, job: &DeliveryJob, error: &str) -> Value {
        json!({
            "status": "failed",
            "error": error,
            "recipient": job.to_email,
            "job_id": job.id,
        })
    }

    async fn health_check(&self) -> Result<bool, StreamError> {
        Ok(self.transport.health_check().await)
    }
}

impl<T: MailTransport> Clone for DeliveryProcessor<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}
