//! Broker connection helpers.
//!
//! Connecting through `ConnectionManager` gives automatic reconnection on
//! transient failures; the retry variant covers brokers that are still
//! starting when the service boots.

use crate::config::RetryPolicy;
use crate::error::StreamError;
use redis::aio::ConnectionManager;
use redis::Client;
use tracing::{info, warn};

/// Connect to the broker and verify the connection with a PING.
pub async fn connect(url: &str) -> Result<ConnectionManager, StreamError> {
    info!(url = %url, "Connecting to Redis");

    let client = Client::open(url)?;
    let manager = ConnectionManager::new(client).await?;

    let mut conn = manager.clone();
    let _: String = redis::cmd("PING").query_async(&mut conn).await?;

    info!("Connected to Redis");
    Ok(manager)
}

/// Connect with retries using the given backoff policy.
pub async fn connect_with_retry(
    url: &str,
    policy: &RetryPolicy,
) -> Result<ConnectionManager, StreamError> {
    let mut attempt: u32 = 0;

    loop {
        match connect(url).await {
            Ok(manager) => return Ok(manager),
            Err(e) => {
                if attempt >= policy.max_retries {
                    warn!(url = %url, attempts = %(attempt + 1), "Giving up connecting to Redis");
                    return Err(e);
                }
                let delay = policy.delay_for_attempt(attempt);
                warn!(
                    url = %url,
                    error = %e,
                    retry_in_ms = %delay.as_millis(),
                    "Redis connection failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Verify broker connectivity (readiness probes).
pub async fn ping(conn: &ConnectionManager) -> Result<(), StreamError> {
    let mut conn = conn.clone();
    let response: String = redis::cmd("PING").query_async(&mut conn).await?;

    if response != "PONG" {
        return Err(StreamError::Internal(format!(
            "unexpected PING response: {}",
            response
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires actual Redis
    async fn test_connect() {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        let manager = connect(&redis_url).await.unwrap();
        ping(&manager).await.unwrap();
    }
}
