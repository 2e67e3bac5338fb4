//! Job runner: the retry/backoff state machine.
//!
//! Drives one job end-to-end: STARTED, then strictly sequential attempts
//! with backoff sleeps between them, ending in SUCCESS or FAILURE recorded
//! in the job-state store. The whole execution runs under the configured
//! soft/hard wall-clock limits.

use crate::config::{RetryPolicy, TimeLimits};
use crate::error::StreamError;
use crate::registry::{StreamJob, StreamProcessor};
use crate::status::{StatusStore, TaskState};
use serde_json::Value;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{error, info, warn};

/// Terminal outcome of one job execution.
#[derive(Debug, Clone)]
pub enum JobOutcome {
    Success { payload: Value, attempts: u32 },
    Failure { payload: Value, attempts: u32 },
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Success { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            JobOutcome::Success { attempts, .. } | JobOutcome::Failure { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn payload(&self) -> &Value {
        match self {
            JobOutcome::Success { payload, .. } | JobOutcome::Failure { payload, .. } => payload,
        }
    }
}

/// Executes jobs against a processor under a retry policy and time limits.
pub struct JobRunner<'a, S: StatusStore> {
    policy: &'a RetryPolicy,
    limits: &'a TimeLimits,
    status: &'a S,
}

impl<'a, S: StatusStore> JobRunner<'a, S> {
    pub fn new(policy: &'a RetryPolicy, limits: &'a TimeLimits, status: &'a S) -> Self {
        Self {
            policy,
            limits,
            status,
        }
    }

    /// Run a job to a terminal state.
    ///
    /// Status-store write failures are logged rather than propagated: the
    /// outcome of the send itself must not depend on the store, and the
    /// caller still needs the outcome to decide DLQ placement.
    pub async fn run<J, P>(&self, processor: &P, job: &J) -> JobOutcome
    where
        J: StreamJob,
        P: StreamProcessor<J>,
    {
        let job_id = job.job_id();

        if let Err(e) = self.status.set_state(&job_id, TaskState::Started).await {
            warn!(job_id = %job_id, error = %e, "Failed to record STARTED state");
        }

        let attempts = AtomicU32::new(0);
        let work = self.attempt_loop(processor, job, &attempts);
        tokio::pin!(work);

        let soft = tokio::time::sleep(self.limits.soft);
        tokio::pin!(soft);
        let hard = tokio::time::sleep(self.limits.hard);
        tokio::pin!(hard);
        let mut soft_elapsed = false;

        let outcome = loop {
            tokio::select! {
                outcome = &mut work => break outcome,
                _ = &mut soft, if !soft_elapsed => {
                    warn!(
                        job_id = %job_id,
                        soft_limit_secs = %self.limits.soft.as_secs(),
                        "Job exceeded soft time limit, still running"
                    );
                    soft_elapsed = true;
                }
                _ = &mut hard => {
                    error!(
                        job_id = %job_id,
                        hard_limit_secs = %self.limits.hard.as_secs(),
                        "Job exceeded hard time limit, terminating"
                    );
                    break JobOutcome::Failure {
                        payload: processor.failure_payload(job, "hard time limit exceeded"),
                        attempts: attempts.load(Ordering::SeqCst),
                    };
                }
            }
        };

        match &outcome {
            JobOutcome::Success { attempts, .. } => {
                info!(
                    job_id = %job_id,
                    attempts = %attempts,
                    processor = %processor.name(),
                    "Job completed successfully"
                );
                if let Err(e) = self.status.record_success(&job_id, outcome.payload()).await {
                    error!(job_id = %job_id, error = %e, "Failed to record SUCCESS state");
                }
            }
            JobOutcome::Failure { attempts, .. } => {
                warn!(
                    job_id = %job_id,
                    attempts = %attempts,
                    processor = %processor.name(),
                    "Job failed terminally"
                );
                if let Err(e) = self.status.record_failure(&job_id, outcome.payload()).await {
                    error!(job_id = %job_id, error = %e, "Failed to record FAILURE state");
                }
            }
        }

        outcome
    }

    /// Sequential attempts with backoff sleeps in between. Attempt N+1
    /// never starts before attempt N's outcome is known.
    async fn attempt_loop<J, P>(&self, processor: &P, job: &J, attempts: &AtomicU32) -> JobOutcome
    where
        J: StreamJob,
        P: StreamProcessor<J>,
    {
        let job_id = job.job_id();

        loop {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;

            match processor.process(job).await {
                Ok(payload) => {
                    return JobOutcome::Success { payload, attempts: attempt };
                }
                Err(e) if !e.category().should_retry() => {
                    error!(
                        job_id = %job_id,
                        attempt = %attempt,
                        error = %e,
                        "Permanent error, failing job without retry"
                    );
                    return JobOutcome::Failure {
                        payload: processor.failure_payload(job, &e.to_string()),
                        attempts: attempt,
                    };
                }
                Err(e) => {
                    // attempt 1 + max_retries retries, then terminal failure
                    if attempt > self.policy.max_retries {
                        warn!(
                            job_id = %job_id,
                            attempts = %attempt,
                            max_retries = %self.policy.max_retries,
                            error = %e,
                            "Retries exhausted, failing job"
                        );
                        return JobOutcome::Failure {
                            payload: processor.failure_payload(job, &e.to_string()),
                            attempts: attempt,
                        };
                    }

                    let delay = self.policy.delay_for_attempt(attempt - 1);
                    if let Err(store_err) = self.status.set_state(&job_id, TaskState::Retry).await {
                        warn!(job_id = %job_id, error = %store_err, "Failed to record RETRY state");
                    }
                    warn!(
                        job_id = %job_id,
                        attempt = %attempt,
                        delay_ms = %delay.as_millis(),
                        error = %e,
                        "Attempt failed, retrying after backoff"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::InMemoryStatusStore;
    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::time::Duration;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct TestJob {
        id: String,
    }

    impl StreamJob for TestJob {
        fn job_id(&self) -> String {
            self.id.clone()
        }
    }

    /// Fails the first `failures` attempts with a transient error, then succeeds.
    struct FlakyProcessor {
        failures: u32,
        calls: AtomicU32,
    }

    impl FlakyProcessor {
        fn failing_first(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl StreamProcessor<TestJob> for FlakyProcessor {
        async fn process(&self, job: &TestJob) -> Result<Value, StreamError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                Err(StreamError::transient("relay rejected the message"))
            } else {
                Ok(json!({"status": "sent", "job_id": job.job_id()}))
            }
        }

        fn name(&self) -> &'static str {
            "FlakyProcessor"
        }
    }

    struct PermanentFailProcessor;

    #[async_trait]
    impl StreamProcessor<TestJob> for PermanentFailProcessor {
        async fn process(&self, _job: &TestJob) -> Result<Value, StreamError> {
            Err(StreamError::permanent("invalid recipient"))
        }

        fn name(&self) -> &'static str {
            "PermanentFailProcessor"
        }
    }

    struct HangingProcessor;

    #[async_trait]
    impl StreamProcessor<TestJob> for HangingProcessor {
        async fn process(&self, _job: &TestJob) -> Result<Value, StreamError> {
            std::future::pending().await
        }

        fn name(&self) -> &'static str {
            "HangingProcessor"
        }
    }

    fn job() -> TestJob {
        TestJob {
            id: "job-1".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_job_fails_after_four_attempts() {
        let policy = RetryPolicy::default();
        let limits = TimeLimits::default();
        let store = InMemoryStatusStore::new();
        let runner = JobRunner::new(&policy, &limits, &store);

        // More failures scripted than attempts available
        let processor = FlakyProcessor::failing_first(100);
        let outcome = runner.run(&processor, &job()).await;

        assert!(!outcome.is_success());
        assert_eq!(outcome.attempts(), 4);
        assert_eq!(processor.calls.load(Ordering::SeqCst), 4);

        let status = store.fetch("job-1").await.unwrap();
        assert_eq!(status.state, TaskState::Failure);
        let error = status.error.unwrap();
        assert_eq!(error["status"], "failed");
        assert_eq!(error["job_id"], "job-1");
        assert!(error["error"].as_str().unwrap().contains("relay rejected"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_job_succeeding_on_second_attempt() {
        let policy = RetryPolicy::default();
        let limits = TimeLimits::default();
        let store = InMemoryStatusStore::new();
        let runner = JobRunner::new(&policy, &limits, &store);

        let processor = FlakyProcessor::failing_first(1);
        let outcome = runner.run(&processor, &job()).await;

        assert!(outcome.is_success());
        assert_eq!(outcome.attempts(), 2);

        let status = store.fetch("job-1").await.unwrap();
        assert_eq!(status.state, TaskState::Success);
        assert_eq!(status.result.unwrap()["status"], "sent");
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_fails_without_retry() {
        let policy = RetryPolicy::default();
        let limits = TimeLimits::default();
        let store = InMemoryStatusStore::new();
        let runner = JobRunner::new(&policy, &limits, &store);

        let outcome = runner.run(&PermanentFailProcessor, &job()).await;

        assert!(!outcome.is_success());
        assert_eq!(outcome.attempts(), 1);

        let status = store.fetch("job-1").await.unwrap();
        assert_eq!(status.state, TaskState::Failure);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hard_time_limit_terminates_hung_job() {
        let policy = RetryPolicy::default();
        let limits = TimeLimits::new(Duration::from_secs(1), Duration::from_secs(2));
        let store = InMemoryStatusStore::new();
        let runner = JobRunner::new(&policy, &limits, &store);

        let outcome = runner.run(&HangingProcessor, &job()).await;

        assert!(!outcome.is_success());
        let status = store.fetch("job-1").await.unwrap();
        assert_eq!(status.state, TaskState::Failure);
        assert!(status.error.unwrap()["error"]
            .as_str()
            .unwrap()
            .contains("hard time limit"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_job_records_result_payload() {
        let policy = RetryPolicy::default();
        let limits = TimeLimits::default();
        let store = InMemoryStatusStore::new();
        let runner = JobRunner::new(&policy, &limits, &store);

        let processor = FlakyProcessor::failing_first(0);
        let outcome = runner.run(&processor, &job()).await;

        assert!(outcome.is_success());
        assert_eq!(outcome.attempts(), 1);
        assert_eq!(outcome.payload()["job_id"], "job-1");
    }
}
