//! Stream consumer for Redis operations
//!
//! Handles reading messages from Redis streams using consumer groups:
//! pending recovery, new-message reads, acknowledgement, abandoned-message
//! claiming (XAUTOCLAIM) and dead-letter placement.

use crate::config::WorkerConfig;
use crate::error::StreamError;
use crate::registry::StreamJob;
use redis::aio::ConnectionManager;
use redis::streams::{StreamReadOptions, StreamReadReply};
use redis::AsyncCommands;
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

/// Stream consumer bound to one consumer-group member.
pub struct StreamConsumer {
    redis: ConnectionManager,
    config: WorkerConfig,
}

impl StreamConsumer {
    /// Create a new StreamConsumer
    pub fn new(redis: ConnectionManager, config: WorkerConfig) -> Self {
        Self { redis, config }
    }

    /// Get a clone of the Redis connection
    pub fn redis(&self) -> ConnectionManager {
        self.redis.clone()
    }

    /// Ensure the consumer group exists.
    pub async fn ensure_consumer_group(&self) -> Result<(), StreamError> {
        let mut conn = self.redis.clone();

        let result: Result<(), redis::RedisError> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg("$")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;

        match result {
            Ok(_) => {
                info!(
                    stream = %self.config.stream_name,
                    group = %self.config.consumer_group,
                    "Created consumer group"
                );
                Ok(())
            }
            Err(e) if e.to_string().contains("BUSYGROUP") => {
                debug!(
                    stream = %self.config.stream_name,
                    group = %self.config.consumer_group,
                    "Consumer group already exists"
                );
                Ok(())
            }
            Err(e) => Err(StreamError::Redis(e)),
        }
    }

    /// Read pending messages that belong to this consumer (claimed from
    /// dead workers or not yet ACKed).
    pub async fn read_pending<J: StreamJob>(&self) -> Result<Vec<(String, J)>, StreamError> {
        let opts = StreamReadOptions::default()
            .group(&self.config.consumer_group, &self.config.consumer_id)
            .count(self.config.batch_size);

        self.read_with_options::<J>(&opts, "0").await
    }

    /// Read new messages from the stream.
    pub async fn read_new<J: StreamJob>(&self) -> Result<Vec<(String, J)>, StreamError> {
        let mut opts = StreamReadOptions::default()
            .group(&self.config.consumer_group, &self.config.consumer_id)
            .count(self.config.batch_size);

        if let Some(timeout) = self.config.block_timeout_ms {
            opts = opts.block(timeout as usize);
        }

        self.read_with_options::<J>(&opts, ">").await
    }

    async fn read_with_options<J: StreamJob>(
        &self,
        opts: &StreamReadOptions,
        id: &str,
    ) -> Result<Vec<(String, J)>, StreamError> {
        let mut conn = self.redis.clone();

        let result: Result<StreamReadReply, _> = conn
            .xread_options(&[&self.config.stream_name], &[id], opts)
            .await;

        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                let err_str = e.to_string().to_lowercase();
                // A blocking read that elapses without messages is not an error
                if err_str.contains("timeout") || err_str.contains("timed out") {
                    return Ok(vec![]);
                }
                return Err(StreamError::Redis(e));
            }
        };

        let mut messages = Vec::new();
        for stream_key in reply.keys {
            for message in stream_key.ids {
                match Self::parse_job::<J>(&message.map) {
                    Ok(job) => messages.push((message.id.clone(), job)),
                    Err(e) => {
                        error!(
                            message_id = %message.id,
                            error = %e,
                            "Failed to parse job, moving to DLQ"
                        );
                        if let Err(dlq_err) = self.move_to_dlq_raw(&message.id, &message.map).await
                        {
                            error!(message_id = %message.id, error = %dlq_err, "Failed to move raw message to DLQ");
                        }
                        let _ = self.ack(&message.id).await;
                    }
                }
            }
        }

        Ok(messages)
    }

    /// Parse a job from a Redis stream entry.
    fn parse_job<J: StreamJob>(map: &HashMap<String, redis::Value>) -> Result<J, StreamError> {
        let job_value = map
            .get("job")
            .ok_or_else(|| StreamError::Internal("Missing 'job' field in message".to_string()))?;

        let job_str = match job_value {
            redis::Value::BulkString(bytes) => String::from_utf8_lossy(bytes).to_string(),
            redis::Value::SimpleString(s) => s.clone(),
            _ => {
                return Err(StreamError::Internal(
                    "Invalid 'job' field type".to_string(),
                ))
            }
        };

        Ok(serde_json::from_str(&job_str)?)
    }

    /// Acknowledge a message.
    pub async fn ack(&self, message_id: &str) -> Result<(), StreamError> {
        let mut conn = self.redis.clone();

        let _: () = conn
            .xack(
                &self.config.stream_name,
                &self.config.consumer_group,
                &[message_id],
            )
            .await?;

        debug!(message_id = %message_id, "Acknowledged message");
        Ok(())
    }

    /// Append a terminally failed job to the dead letter queue.
    pub async fn move_to_dlq<J: StreamJob>(&self, job: &J, error: &str) -> Result<(), StreamError> {
        let mut conn = self.redis.clone();

        let job_json = serde_json::to_string(job)?;

        let _: String = redis::cmd("XADD")
            .arg(&self.config.dlq_stream)
            .arg("*")
            .arg("job")
            .arg(&job_json)
            .arg("error")
            .arg(error)
            .arg("failed_at")
            .arg(chrono::Utc::now().to_rfc3339())
            .query_async(&mut conn)
            .await?;

        warn!(job_id = %job.job_id(), "Moved job to DLQ");
        Ok(())
    }

    /// Move a raw, unparseable message to the DLQ.
    async fn move_to_dlq_raw(
        &self,
        message_id: &str,
        map: &HashMap<String, redis::Value>,
    ) -> Result<(), StreamError> {
        let mut conn = self.redis.clone();

        let dlq_entry = serde_json::json!({
            "raw_message": format!("{:?}", map),
            "original_id": message_id,
            "error": "Failed to parse job",
            "failed_at": chrono::Utc::now().to_rfc3339(),
        });

        let _: String = redis::cmd("XADD")
            .arg(&self.config.dlq_stream)
            .arg("*")
            .arg("data")
            .arg(dlq_entry.to_string())
            .query_async(&mut conn)
            .await?;

        Ok(())
    }

    /// Claim ALL pending messages on startup, regardless of idle time.
    ///
    /// Worker restarts mint new consumer IDs; without this, entries
    /// delivered to a previous incarnation would sit unclaimed until the
    /// idle threshold.
    pub async fn claim_all_pending_on_startup(&self) -> Result<(), StreamError> {
        let total_claimed = self.autoclaim(0, 100).await?;

        if total_claimed > 0 {
            info!(
                count = total_claimed,
                consumer = %self.config.consumer_id,
                "Claimed pending messages on startup"
            );
        }

        Ok(())
    }

    /// Claim messages abandoned by crashed workers.
    pub async fn claim_abandoned_messages(&self) -> Result<(), StreamError> {
        let claimed = self.autoclaim(self.config.claim_timeout_ms, 10).await?;

        if claimed > 0 {
            info!(
                count = claimed,
                consumer = %self.config.consumer_id,
                "Claimed abandoned messages"
            );
        }

        Ok(())
    }

    /// Run XAUTOCLAIM to completion, returning the number of claimed entries.
    /// Claimed entries surface through the next pending read.
    async fn autoclaim(&self, min_idle_ms: u64, count: usize) -> Result<usize, StreamError> {
        let mut conn = self.redis.clone();
        let mut total_claimed = 0;
        let mut start_id = "0-0".to_string();

        loop {
            let result: redis::Value = redis::cmd("XAUTOCLAIM")
                .arg(&self.config.stream_name)
                .arg(&self.config.consumer_group)
                .arg(&self.config.consumer_id)
                .arg(min_idle_ms)
                .arg(&start_id)
                .arg("COUNT")
                .arg(count)
                .query_async(&mut conn)
                .await
                .unwrap_or(redis::Value::Nil);

            // XAUTOCLAIM reply: [next-start-id, [[msg-id, fields], ...], [deleted-ids]]
            let redis::Value::Array(arr) = &result else {
                break;
            };
            if arr.len() < 2 {
                break;
            }

            match &arr[0] {
                redis::Value::BulkString(next_id) => {
                    let next = String::from_utf8_lossy(next_id).to_string();
                    if next == "0-0" {
                        if let redis::Value::Array(messages) = &arr[1] {
                            total_claimed += messages.len();
                        }
                        break;
                    }
                    start_id = next;
                }
                _ => break,
            }

            match &arr[1] {
                redis::Value::Array(messages) if !messages.is_empty() => {
                    total_claimed += messages.len();
                }
                _ => break,
            }
        }

        Ok(total_claimed)
    }
}
