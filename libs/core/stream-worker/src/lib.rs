//! Stream Worker Framework
//!
//! A generic Redis Streams task-queue framework for background jobs.
//!
//! ## Features
//!
//! - **Generic worker**: `StreamWorker<J, P, S>` processes any job type
//! - **Consumer groups**: Horizontal scaling with Redis consumer groups
//! - **Retries**: Exponential backoff with jitter, driven by an explicit
//!   `RetryPolicy` and error categorization (transient vs. permanent)
//! - **Job-state store**: Redis-backed result backend keyed by job id
//!   (PENDING/STARTED/RETRY/SUCCESS/FAILURE)
//! - **Dead Letter Queue**: Terminally failed jobs appended to a DLQ stream
//! - **Time limits**: Soft (warn) and hard (terminate) wall-clock budgets
//! - **Health endpoints**: Liveness/readiness probes for workers
//!
//! ## Example
//!
//! ```ignore
//! use stream_worker::{StreamDef, StreamJob, StreamProcessor, StreamWorker, WorkerConfig};
//!
//! // Define your job type
//! #[derive(Clone, Serialize, Deserialize)]
//! struct MyJob { /* ... */ }
//!
//! impl StreamJob for MyJob { /* ... */ }
//!
//! // Define your stream
//! struct MyStream;
//! impl StreamDef for MyStream {
//!     const STREAM_NAME: &'static str = "my:jobs";
//!     const CONSUMER_GROUP: &'static str = "my_workers";
//!     const DLQ_STREAM: &'static str = "my:dlq";
//! }
//!
//! // Create processor and run
//! let config = WorkerConfig::from_stream_def::<MyStream>();
//! let status = RedisStatusStore::new(redis.clone());
//! let worker = StreamWorker::new(redis, processor, status, config);
//! worker.run(shutdown_rx).await?;
//! ```

mod config;
mod connection;
mod consumer;
mod error;
mod health;
mod producer;
mod registry;
mod runner;
mod status;
mod worker;

// Re-export main types
pub use config::{RetryPolicy, TimeLimits, WorkerConfig};
pub use connection::{connect, connect_with_retry, ping};
pub use consumer::StreamConsumer;
pub use error::{ErrorCategory, StreamError};
pub use health::{worker_router, HealthState};
pub use producer::StreamProducer;
pub use registry::{StreamDef, StreamJob, StreamProcessor};
pub use runner::{JobOutcome, JobRunner};
pub use status::{InMemoryStatusStore, RedisStatusStore, StatusStore, TaskState, TaskStatus};
pub use worker::StreamWorker;
