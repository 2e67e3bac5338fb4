//! Worker configuration
//!
//! This module provides `WorkerConfig` for configuring the stream worker,
//! plus the explicit `RetryPolicy` and `TimeLimits` structs it composes.

use crate::registry::StreamDef;
use rand::RngExt;
use std::time::Duration;
use uuid::Uuid;

/// Retry policy for failed jobs: exponential backoff with optional jitter.
///
/// Passed explicitly to the job runner; composition, not inheritance.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum retries after the initial attempt (3 retries = 4 total attempts)
    pub max_retries: u32,

    /// Base delay before the first retry, in milliseconds
    pub base_delay_ms: u64,

    /// Backoff ceiling in milliseconds
    pub max_delay_ms: u64,

    /// Randomize each delay to avoid synchronized retry storms
    pub jitter: bool,
}

impl RetryPolicy {
    /// Set the maximum number of retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the base delay in milliseconds
    pub fn with_base_delay_ms(mut self, delay_ms: u64) -> Self {
        self.base_delay_ms = delay_ms;
        self
    }

    /// Set the backoff ceiling in milliseconds
    pub fn with_max_delay_ms(mut self, delay_ms: u64) -> Self {
        self.max_delay_ms = delay_ms;
        self
    }

    /// Disable jitter (deterministic delays, mainly for tests)
    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// Delay before retry number `retry_index` (0-based).
    ///
    /// Grows as `base * 2^retry_index`, capped at `max_delay_ms`. With
    /// jitter enabled the result is scaled by a random factor in 0.5..=1.0.
    pub fn delay_for_attempt(&self, retry_index: u32) -> Duration {
        let exponential = self
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(retry_index));
        let capped = exponential.min(self.max_delay_ms);

        let delay_ms = if self.jitter {
            let factor: f64 = rand::rng().random_range(0.5..=1.0);
            (capped as f64 * factor) as u64
        } else {
            capped
        };

        Duration::from_millis(delay_ms)
    }
}

impl Default for RetryPolicy {
    /// 3 retries, 1s base delay, 600s ceiling, jitter on
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 600_000,
            jitter: true,
        }
    }
}

/// Per-job wall-clock budget, measured from job start.
///
/// The soft limit logs a warning while the job keeps running; the hard
/// limit force-terminates the execution with a terminal failure. A safety
/// net against hung connections, generous relative to a single send.
#[derive(Debug, Clone)]
pub struct TimeLimits {
    /// Warn after this long
    pub soft: Duration,
    /// Terminate after this long
    pub hard: Duration,
}

impl TimeLimits {
    pub fn new(soft: Duration, hard: Duration) -> Self {
        Self { soft, hard }
    }
}

impl Default for TimeLimits {
    /// Soft 25 minutes, hard 30 minutes
    fn default() -> Self {
        Self {
            soft: Duration::from_secs(25 * 60),
            hard: Duration::from_secs(30 * 60),
        }
    }
}

/// Configuration for the stream worker
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Redis stream name
    pub stream_name: String,

    /// Consumer group name
    pub consumer_group: String,

    /// Unique consumer ID (auto-generated if not provided)
    pub consumer_id: String,

    /// Dead letter queue stream name
    pub dlq_stream: String,

    /// Maximum stream length before trimming
    pub max_length: i64,

    /// Poll interval in milliseconds when no messages are available
    pub poll_interval_ms: u64,

    /// Batch size for reading messages (the prefetch knob)
    pub batch_size: usize,

    /// Blocking read timeout in milliseconds (None = non-blocking polling)
    pub block_timeout_ms: Option<u64>,

    /// Claim timeout in milliseconds for abandoned messages
    pub claim_timeout_ms: u64,

    /// Retry policy applied by the job runner
    pub retry: RetryPolicy,

    /// Soft/hard wall-clock limits applied by the job runner
    pub limits: TimeLimits,
}

impl WorkerConfig {
    /// Create a new WorkerConfig from a StreamDef
    pub fn from_stream_def<S: StreamDef>() -> Self {
        Self {
            stream_name: S::STREAM_NAME.to_string(),
            consumer_group: S::CONSUMER_GROUP.to_string(),
            consumer_id: format!("worker-{}", Uuid::new_v4()),
            dlq_stream: S::DLQ_STREAM.to_string(),
            max_length: S::MAX_LENGTH,
            poll_interval_ms: 500,
            batch_size: 10,
            block_timeout_ms: None,
            claim_timeout_ms: 30_000,
            retry: RetryPolicy::default(),
            limits: TimeLimits::default(),
        }
    }

    /// Create a new WorkerConfig with explicit stream and group names
    pub fn new(stream_name: impl Into<String>, consumer_group: impl Into<String>) -> Self {
        Self {
            stream_name: stream_name.into(),
            consumer_group: consumer_group.into(),
            consumer_id: format!("worker-{}", Uuid::new_v4()),
            dlq_stream: String::new(),
            max_length: 100_000,
            poll_interval_ms: 500,
            batch_size: 10,
            block_timeout_ms: None,
            claim_timeout_ms: 30_000,
            retry: RetryPolicy::default(),
            limits: TimeLimits::default(),
        }
    }

    /// Set the consumer ID
    pub fn with_consumer_id(mut self, id: impl Into<String>) -> Self {
        self.consumer_id = id.into();
        self
    }

    /// Set the DLQ stream name
    pub fn with_dlq_stream(mut self, stream: impl Into<String>) -> Self {
        self.dlq_stream = stream.into();
        self
    }

    /// Set the batch size (prefetch)
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Set the poll interval
    pub fn with_poll_interval_ms(mut self, interval: u64) -> Self {
        self.poll_interval_ms = interval;
        self
    }

    /// Set the blocking timeout (None for non-blocking polling)
    pub fn with_blocking(mut self, timeout_ms: Option<u64>) -> Self {
        self.block_timeout_ms = timeout_ms;
        self
    }

    /// Set the claim timeout for abandoned messages
    pub fn with_claim_timeout_ms(mut self, timeout: u64) -> Self {
        self.claim_timeout_ms = timeout;
        self
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the time limits
    pub fn with_limits(mut self, limits: TimeLimits) -> Self {
        self.limits = limits;
        self
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self::new("stream:jobs", "workers")
    }
}
