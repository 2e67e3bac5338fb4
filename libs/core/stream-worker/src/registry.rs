//! Stream registry traits.
//!
//! This module provides:
//! - `StreamDef` trait for domain-specific stream definitions
//! - `StreamJob` trait for job payloads
//! - `StreamProcessor` trait for job processors

use crate::error::StreamError;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};

/// Stream definition trait.
///
/// Each domain implements this trait to define its stream configuration.
/// This keeps producer and worker agreed on naming.
///
/// # Example
///
/// ```rust,ignore
/// use stream_worker::StreamDef;
///
/// pub struct EmailStream;
///
/// impl StreamDef for EmailStream {
///     const STREAM_NAME: &'static str = "email:jobs";
///     const CONSUMER_GROUP: &'static str = "email_workers";
///     const DLQ_STREAM: &'static str = "email:dlq";
/// }
/// ```
pub trait StreamDef: Send + Sync {
    /// The Redis stream name (e.g., "email:jobs").
    const STREAM_NAME: &'static str;

    /// The consumer group name for this stream.
    const CONSUMER_GROUP: &'static str;

    /// The dead letter queue stream name for failed jobs.
    const DLQ_STREAM: &'static str;

    /// Maximum stream length before auto-trim (MAXLEN).
    /// Default: 100,000 entries.
    const MAX_LENGTH: i64 = 100_000;

    /// Get the stream name.
    fn stream_name() -> &'static str {
        Self::STREAM_NAME
    }

    /// Get the consumer group name.
    fn consumer_group() -> &'static str {
        Self::CONSUMER_GROUP
    }

    /// Get the DLQ stream name.
    fn dlq_stream() -> &'static str {
        Self::DLQ_STREAM
    }
}

/// Trait for stream job payloads.
///
/// Domain models that represent queued jobs implement this trait. The
/// `job_id` doubles as the key into the job-state store, so it must be
/// stable across serialization and unique per job.
pub trait StreamJob: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Returns the job ID used for state tracking and logging.
    fn job_id(&self) -> String;
}

/// Trait for job processors.
///
/// A processor performs a single attempt of a job and reports the outcome
/// as a value, never by panicking or leaking transport-internal errors:
/// `Ok(payload)` on success, a transient error for retryable failures and
/// a permanent error for failures that must not be retried. The runner
/// inspects the returned category to decide retry vs. terminal state.
#[async_trait]
pub trait StreamProcessor<J: StreamJob>: Send + Sync {
    /// Perform one attempt of the job.
    ///
    /// On success, returns the structured result payload recorded in the
    /// job-state store.
    async fn process(&self, job: &J) -> Result<Value, StreamError>;

    /// Get the processor name for logging.
    fn name(&self) -> &'static str;

    /// Structured payload recorded in the job-state store on terminal
    /// failure. Override to add domain fields.
    fn failure_payload(&self, job: &J, error: &str) -> Value {
        json!({
            "status": "failed",
            "error": error,
            "job_id": job.job_id(),
        })
    }

    /// Health check for the processor.
    ///
    /// Override this to check external services (e.g., the SMTP relay).
    async fn health_check(&self) -> Result<bool, StreamError> {
        Ok(true)
    }
}
