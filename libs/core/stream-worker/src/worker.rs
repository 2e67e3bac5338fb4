//! The generic stream worker loop.
//!
//! `StreamWorker` ties the consumer, the job runner and the job-state
//! store together: it reads deliveries from the consumer group, drives
//! each job to a terminal state via `JobRunner` (one job at a time,
//! end-to-end), appends terminal failures to the DLQ and acknowledges the
//! delivery. Concurrency scales by running more workers, not by
//! interleaving jobs within one.

use crate::config::WorkerConfig;
use crate::consumer::StreamConsumer;
use crate::error::StreamError;
use crate::registry::{StreamJob, StreamProcessor};
use crate::runner::{JobOutcome, JobRunner};
use crate::status::StatusStore;
use redis::aio::ConnectionManager;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Generic stream worker that processes jobs using a processor.
pub struct StreamWorker<J, P, S>
where
    J: StreamJob,
    P: StreamProcessor<J>,
    S: StatusStore,
{
    consumer: StreamConsumer,
    processor: Arc<P>,
    status: Arc<S>,
    config: WorkerConfig,
    _phantom: PhantomData<J>,
}

impl<J, P, S> StreamWorker<J, P, S>
where
    J: StreamJob + 'static,
    P: StreamProcessor<J> + 'static,
    S: StatusStore + 'static,
{
    /// Create a new stream worker.
    pub fn new(redis: ConnectionManager, processor: P, status: S, config: WorkerConfig) -> Self {
        let consumer = StreamConsumer::new(redis, config.clone());

        Self {
            consumer,
            processor: Arc::new(processor),
            status: Arc::new(status),
            config,
            _phantom: PhantomData,
        }
    }

    /// Get a reference to the consumer (health checks).
    pub fn consumer(&self) -> &StreamConsumer {
        &self.consumer
    }

    /// Get a clone of the Redis connection manager.
    pub fn redis(&self) -> ConnectionManager {
        self.consumer.redis()
    }

    /// Run the worker loop.
    ///
    /// Continuously reads jobs from the stream and processes them. Use the
    /// shutdown receiver to gracefully stop the worker; a job in flight
    /// finishes before the loop exits.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), StreamError> {
        info!(
            consumer_id = %self.config.consumer_id,
            stream = %self.config.stream_name,
            group = %self.config.consumer_group,
            processor = %self.processor.name(),
            "Starting stream worker"
        );

        self.consumer.ensure_consumer_group().await?;

        if let Err(e) = self.consumer.claim_all_pending_on_startup().await {
            warn!(error = %e, "Failed to claim pending messages on startup");
        }

        let poll_interval = Duration::from_millis(self.config.poll_interval_ms);
        let claim_interval = Duration::from_millis(self.config.claim_timeout_ms * 2);
        let mut last_claim = std::time::Instant::now();
        let is_blocking = self.config.block_timeout_ms.is_some();

        // Consecutive connection errors drive exponential backoff
        let mut consecutive_errors: u32 = 0;
        const MAX_BACKOFF_SECS: u64 = 30;

        info!(
            poll_interval_ms = %self.config.poll_interval_ms,
            block_timeout_ms = ?self.config.block_timeout_ms,
            batch_size = %self.config.batch_size,
            "Worker polling configuration"
        );

        loop {
            if *shutdown.borrow() {
                info!("Received shutdown signal, stopping worker");
                break;
            }

            match self.process_batch().await {
                Ok(_) => {
                    if consecutive_errors > 0 {
                        info!("Connection recovered after {} errors", consecutive_errors);
                        consecutive_errors = 0;
                    }
                }
                Err(e) => {
                    consecutive_errors += 1;

                    if e.is_nogroup_error() {
                        warn!("Consumer group missing, recreating...");
                        if let Err(create_err) = self.consumer.ensure_consumer_group().await {
                            error!(error = %create_err, "Failed to recreate consumer group");
                        }
                    } else if e.is_connection_error() {
                        let backoff_secs =
                            std::cmp::min(2u64.pow(consecutive_errors.min(5)), MAX_BACKOFF_SECS);
                        warn!(
                            error = %e,
                            consecutive_errors = %consecutive_errors,
                            backoff_secs = %backoff_secs,
                            "Redis connection error, backing off"
                        );
                        tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
                    } else {
                        error!(error = %e, "Error processing batch");
                    }

                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
            }

            // Periodically claim abandoned messages from crashed workers
            if last_claim.elapsed() >= claim_interval {
                if let Err(e) = self.consumer.claim_abandoned_messages().await {
                    debug!(error = %e, "Error claiming abandoned messages");
                }
                last_claim = std::time::Instant::now();
            }

            // In blocking mode Redis BLOCK handles the waiting
            if !is_blocking {
                tokio::select! {
                    _ = shutdown.changed() => {
                        if *shutdown.borrow() {
                            info!("Received shutdown signal, stopping worker");
                            break;
                        }
                    }
                    _ = tokio::time::sleep(poll_interval) => {}
                }
            }
        }

        info!("Stream worker stopped");
        Ok(())
    }

    /// Process one batch: recovered pending messages first, then new ones.
    async fn process_batch(&self) -> Result<(), StreamError> {
        let pending = self.consumer.read_pending::<J>().await?;
        let new_messages = self.consumer.read_new::<J>().await?;

        let total = pending.len() + new_messages.len();
        if total == 0 {
            return Ok(());
        }

        debug!(count = total, "Processing batch");

        for (message_id, job) in pending.into_iter().chain(new_messages) {
            self.process_delivery(&message_id, &job).await;
        }

        Ok(())
    }

    /// Drive one delivery to a terminal state and acknowledge it.
    async fn process_delivery(&self, message_id: &str, job: &J) {
        debug!(
            message_id = %message_id,
            job_id = %job.job_id(),
            "Processing job"
        );

        let runner = JobRunner::new(&self.config.retry, &self.config.limits, &*self.status);
        let outcome = runner.run(&*self.processor, job).await;

        if let JobOutcome::Failure { payload, .. } = &outcome {
            let reason = payload["error"].as_str().unwrap_or("unknown error");
            if let Err(e) = self.consumer.move_to_dlq(job, reason).await {
                error!(
                    message_id = %message_id,
                    job_id = %job.job_id(),
                    error = %e,
                    "Failed to move job to DLQ"
                );
            }
        }

        // ACK regardless of outcome; the terminal state lives in the
        // status store and the DLQ, not in the delivery stream.
        if let Err(e) = self.consumer.ack(message_id).await {
            error!(message_id = %message_id, error = %e, "Failed to ACK message");
        }
    }
}
