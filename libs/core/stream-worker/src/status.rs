//! Job-state store (result backend).
//!
//! Each job gets a record keyed by its job id holding the current state
//! plus, for terminal states, a structured result or error payload. The
//! store inherits Redis semantics: a key that was never written (or has
//! expired) reads back as PENDING - unknown and not-yet-visible ids are
//! indistinguishable by design.

use crate::error::StreamError;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumString};
use tokio::sync::RwLock;
use tracing::debug;

/// Queue-native job states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Display, AsRefStr, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    /// Queued (or unknown to the store).
    Pending,
    /// Picked up by a worker.
    Started,
    /// Last attempt failed; waiting for the next one.
    Retry,
    /// Delivered successfully. Terminal.
    Success,
    /// Failed after exhausting retries (or permanently). Terminal.
    Failure,
}

impl TaskState {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Success | TaskState::Failure)
    }
}

/// A job-state record as read from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub task_id: String,
    pub state: TaskState,
    /// Present only when the state is SUCCESS.
    pub result: Option<Value>,
    /// Structured failure payload, present only when the state is FAILURE.
    pub error: Option<Value>,
}

impl TaskStatus {
    /// The record returned for ids the store has never seen.
    pub fn pending(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            state: TaskState::Pending,
            result: None,
            error: None,
        }
    }
}

/// Job-state store interface.
///
/// State transitions flow exclusively through these primitives; nothing
/// else mutates job state.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Record a non-terminal state transition.
    async fn set_state(&self, task_id: &str, state: TaskState) -> Result<(), StreamError>;

    /// Record terminal success with its result payload.
    async fn record_success(&self, task_id: &str, result: &Value) -> Result<(), StreamError>;

    /// Record terminal failure with its structured error payload.
    async fn record_failure(&self, task_id: &str, error: &Value) -> Result<(), StreamError>;

    /// Read the current record for a job id. Unknown ids read as PENDING.
    async fn fetch(&self, task_id: &str) -> Result<TaskStatus, StreamError>;
}

/// Redis-backed status store: one hash per job with a TTL.
#[derive(Clone)]
pub struct RedisStatusStore {
    redis: ConnectionManager,
    key_prefix: String,
    ttl_secs: u64,
}

impl RedisStatusStore {
    /// Create a store with the default key prefix and a 24h record TTL.
    pub fn new(redis: ConnectionManager) -> Self {
        Self {
            redis,
            key_prefix: "task:".to_string(),
            ttl_secs: 86_400,
        }
    }

    /// Set the key prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Set the record TTL in seconds.
    pub fn with_ttl_secs(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    fn key(&self, task_id: &str) -> String {
        format!("{}{}", self.key_prefix, task_id)
    }

    async fn write(&self, task_id: &str, fields: &[(&str, String)]) -> Result<(), StreamError> {
        let mut conn = self.redis.clone();
        let key = self.key(task_id);

        let mut pipe = redis::pipe();
        let hset = pipe.cmd("HSET").arg(&key);
        for (field, value) in fields {
            hset.arg(*field).arg(value);
        }
        pipe.cmd("EXPIRE").arg(&key).arg(self.ttl_secs);

        pipe.query_async::<()>(&mut conn).await?;
        Ok(())
    }
}

#[async_trait]
impl StatusStore for RedisStatusStore {
    async fn set_state(&self, task_id: &str, state: TaskState) -> Result<(), StreamError> {
        debug!(task_id = %task_id, state = %state, "Recording job state");
        self.write(task_id, &[("state", state.to_string())]).await
    }

    async fn record_success(&self, task_id: &str, result: &Value) -> Result<(), StreamError> {
        debug!(task_id = %task_id, "Recording job success");
        self.write(
            task_id,
            &[
                ("state", TaskState::Success.to_string()),
                ("result", result.to_string()),
            ],
        )
        .await
    }

    async fn record_failure(&self, task_id: &str, error: &Value) -> Result<(), StreamError> {
        debug!(task_id = %task_id, "Recording job failure");
        self.write(
            task_id,
            &[
                ("state", TaskState::Failure.to_string()),
                ("error", error.to_string()),
            ],
        )
        .await
    }

    async fn fetch(&self, task_id: &str) -> Result<TaskStatus, StreamError> {
        let mut conn = self.redis.clone();

        let map: HashMap<String, String> = redis::cmd("HGETALL")
            .arg(self.key(task_id))
            .query_async(&mut conn)
            .await?;

        if map.is_empty() {
            return Ok(TaskStatus::pending(task_id));
        }

        let state = map
            .get("state")
            .and_then(|s| TaskState::from_str(s).ok())
            .unwrap_or(TaskState::Pending);

        let result = map
            .get("result")
            .and_then(|raw| serde_json::from_str(raw).ok());
        let error = map
            .get("error")
            .and_then(|raw| serde_json::from_str(raw).ok());

        Ok(TaskStatus {
            task_id: task_id.to_string(),
            state,
            result,
            error,
        })
    }
}

/// In-memory status store for tests and local experiments.
#[derive(Default)]
pub struct InMemoryStatusStore {
    records: RwLock<HashMap<String, TaskStatus>>,
}

impl InMemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatusStore for InMemoryStatusStore {
    async fn set_state(&self, task_id: &str, state: TaskState) -> Result<(), StreamError> {
        let mut records = self.records.write().await;
        let record = records
            .entry(task_id.to_string())
            .or_insert_with(|| TaskStatus::pending(task_id));
        record.state = state;
        Ok(())
    }

    async fn record_success(&self, task_id: &str, result: &Value) -> Result<(), StreamError> {
        let mut records = self.records.write().await;
        records.insert(
            task_id.to_string(),
            TaskStatus {
                task_id: task_id.to_string(),
                state: TaskState::Success,
                result: Some(result.clone()),
                error: None,
            },
        );
        Ok(())
    }

    async fn record_failure(&self, task_id: &str, error: &Value) -> Result<(), StreamError> {
        let mut records = self.records.write().await;
        records.insert(
            task_id.to_string(),
            TaskStatus {
                task_id: task_id.to_string(),
                state: TaskState::Failure,
                result: None,
                error: Some(error.clone()),
            },
        );
        Ok(())
    }

    async fn fetch(&self, task_id: &str) -> Result<TaskStatus, StreamError> {
        let records = self.records.read().await;
        Ok(records
            .get(task_id)
            .cloned()
            .unwrap_or_else(|| TaskStatus::pending(task_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_state_display_matches_queue_vocabulary() {
        assert_eq!(TaskState::Pending.to_string(), "PENDING");
        assert_eq!(TaskState::Started.to_string(), "STARTED");
        assert_eq!(TaskState::Retry.to_string(), "RETRY");
        assert_eq!(TaskState::Success.to_string(), "SUCCESS");
        assert_eq!(TaskState::Failure.to_string(), "FAILURE");
    }

    #[test]
    fn test_task_state_round_trips_through_str() {
        let state = TaskState::from_str("FAILURE").unwrap();
        assert_eq!(state, TaskState::Failure);
        assert!(state.is_terminal());
        assert!(!TaskState::Retry.is_terminal());
    }

    #[tokio::test]
    async fn test_in_memory_unknown_id_reads_as_pending() {
        let store = InMemoryStatusStore::new();
        let status = store.fetch("no-such-job").await.unwrap();

        assert_eq!(status.state, TaskState::Pending);
        assert!(status.result.is_none());
        assert!(status.error.is_none());
    }

    #[tokio::test]
    async fn test_in_memory_success_roundtrip() {
        let store = InMemoryStatusStore::new();
        store.set_state("job-1", TaskState::Started).await.unwrap();
        store
            .record_success("job-1", &json!({"status": "sent"}))
            .await
            .unwrap();

        let status = store.fetch("job-1").await.unwrap();
        assert_eq!(status.state, TaskState::Success);
        assert_eq!(status.result, Some(json!({"status": "sent"})));
        assert!(status.error.is_none());
    }

    #[tokio::test]
    async fn test_in_memory_terminal_reads_are_idempotent() {
        let store = InMemoryStatusStore::new();
        store
            .record_failure("job-2", &json!({"status": "failed", "error": "relay down"}))
            .await
            .unwrap();

        let first = store.fetch("job-2").await.unwrap();
        let second = store.fetch("job-2").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.state, TaskState::Failure);
    }
}
