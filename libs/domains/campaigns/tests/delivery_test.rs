//! Delivery semantics over the job runner with a scripted transport.

use domain_campaigns::{DeliveryJob, DeliveryProcessor, EmailCampaign, MockTransport};
use std::time::Duration;
use stream_worker::{
    InMemoryStatusStore, JobRunner, RetryPolicy, StatusStore, StreamJob, TaskState, TimeLimits,
};

fn delivery_job(recipient: &str) -> DeliveryJob {
    let campaign = EmailCampaign::new(
        vec![recipient.to_string()],
        "Quarterly update".to_string(),
        "Hello there".to_string(),
        None,
    )
    .unwrap();
    DeliveryJob::for_recipient(&campaign, recipient)
}

#[tokio::test(start_paused = true)]
async fn test_always_failing_transport_fails_after_four_attempts() {
    let policy = RetryPolicy::default();
    let limits = TimeLimits::default();
    let store = InMemoryStatusStore::new();
    let runner = JobRunner::new(&policy, &limits, &store);

    let processor = DeliveryProcessor::new(MockTransport::failing("connection dropped"));
    let job = delivery_job("user@domain.tld");

    let outcome = runner.run(&processor, &job).await;

    // Initial attempt + 3 retries
    assert!(!outcome.is_success());
    assert_eq!(outcome.attempts(), 4);
    assert_eq!(processor.transport().send_count(), 4);

    let status = store.fetch(&job.job_id()).await.unwrap();
    assert_eq!(status.state, TaskState::Failure);

    let error = status.error.unwrap();
    assert_eq!(error["status"], "failed");
    assert_eq!(error["recipient"], "user@domain.tld");
    assert_eq!(error["job_id"], job.id.to_string());
    assert!(error["error"].as_str().unwrap().contains("connection dropped"));
}

#[tokio::test(start_paused = true)]
async fn test_delays_between_attempts_grow() {
    let policy = RetryPolicy::default().without_jitter();
    let limits = TimeLimits::default();
    let store = InMemoryStatusStore::new();
    let runner = JobRunner::new(&policy, &limits, &store);

    let processor = DeliveryProcessor::new(MockTransport::failing("relay busy"));
    let job = delivery_job("user@domain.tld");

    let started = tokio::time::Instant::now();
    runner.run(&processor, &job).await;

    // Backoff sleeps of 1s, 2s and 4s separate the four attempts
    assert!(started.elapsed() >= Duration::from_secs(7));
}

#[tokio::test(start_paused = true)]
async fn test_delivery_succeeds_on_second_attempt() {
    let policy = RetryPolicy::default();
    let limits = TimeLimits::default();
    let store = InMemoryStatusStore::new();
    let runner = JobRunner::new(&policy, &limits, &store);

    let processor = DeliveryProcessor::new(MockTransport::failing_first(1, "relay busy"));
    let job = delivery_job("user@domain.tld");

    let outcome = runner.run(&processor, &job).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.attempts(), 2);

    let status = store.fetch(&job.job_id()).await.unwrap();
    assert_eq!(status.state, TaskState::Success);

    let result = status.result.unwrap();
    assert_eq!(result["status"], "sent");
    assert_eq!(result["recipient"], "user@domain.tld");
}

#[tokio::test]
async fn test_unknown_task_id_reads_pending() {
    let store = InMemoryStatusStore::new();

    let status = store.fetch("definitely-not-a-job").await.unwrap();
    assert_eq!(status.state, TaskState::Pending);
    assert!(status.result.is_none());
    assert!(status.error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_terminal_status_reads_are_idempotent() {
    let policy = RetryPolicy::default();
    let limits = TimeLimits::default();
    let store = InMemoryStatusStore::new();
    let runner = JobRunner::new(&policy, &limits, &store);

    let processor = DeliveryProcessor::new(MockTransport::accepting());
    let job = delivery_job("user@domain.tld");
    runner.run(&processor, &job).await;

    let first = store.fetch(&job.job_id()).await.unwrap();
    let second = store.fetch(&job.job_id()).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.state, TaskState::Success);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_recipient_fails_without_touching_transport() {
    let policy = RetryPolicy::default();
    let limits = TimeLimits::default();
    let store = InMemoryStatusStore::new();
    let runner = JobRunner::new(&policy, &limits, &store);

    let processor = DeliveryProcessor::new(MockTransport::accepting());
    let mut job = delivery_job("user@domain.tld");
    job.to_email = "broken".to_string();

    let outcome = runner.run(&processor, &job).await;

    // Construction failure is permanent: a single attempt, no retries
    assert!(!outcome.is_success());
    assert_eq!(outcome.attempts(), 1);
    assert_eq!(processor.transport().send_count(), 0);

    let status = store.fetch(&job.job_id()).await.unwrap();
    assert_eq!(status.state, TaskState::Failure);
}
