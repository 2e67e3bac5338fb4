use crate::{env_or_default, ConfigError, FromEnv};

/// Redis configuration for the task queue: broker URL (message transport)
/// and result-store URL (job-state persistence).
///
/// Both default to the same local Redis instance derived from
/// `REDIS_HOST`/`REDIS_PORT`/`REDIS_DB` when `BROKER_URL` and
/// `RESULT_STORE_URL` are not set explicitly.
#[derive(Clone, Debug)]
pub struct RedisConfig {
    /// Connection URL for the job broker.
    pub broker_url: String,
    /// Connection URL for the job-state store.
    pub result_store_url: String,
}

impl RedisConfig {
    /// Create a config where broker and result store share one URL.
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            broker_url: url.clone(),
            result_store_url: url,
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self::new("redis://127.0.0.1:6379/0")
    }
}

impl FromEnv for RedisConfig {
    /// Environment variables:
    /// - `BROKER_URL` (optional) - explicit broker connection string
    /// - `RESULT_STORE_URL` (optional) - explicit result-store connection string
    /// - `REDIS_HOST` (default "127.0.0.1"), `REDIS_PORT` (default 6379),
    ///   `REDIS_DB` (default 0) - used to derive the URLs when the explicit
    ///   ones are absent
    fn from_env() -> Result<Self, ConfigError> {
        let host = env_or_default("REDIS_HOST", "127.0.0.1");
        let port: u16 = env_or_default("REDIS_PORT", "6379")
            .parse()
            .map_err(|e| ConfigError::ParseError {
                key: "REDIS_PORT".to_string(),
                details: format!("{}", e),
            })?;
        let db: u8 = env_or_default("REDIS_DB", "0")
            .parse()
            .map_err(|e| ConfigError::ParseError {
                key: "REDIS_DB".to_string(),
                details: format!("{}", e),
            })?;

        let derived = format!("redis://{}:{}/{}", host, port, db);

        Ok(Self {
            broker_url: env_or_default("BROKER_URL", &derived),
            result_store_url: env_or_default("RESULT_STORE_URL", &derived),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redis_config_derives_urls_from_defaults() {
        temp_env::with_vars(
            [
                ("BROKER_URL", None::<&str>),
                ("RESULT_STORE_URL", None),
                ("REDIS_HOST", None),
                ("REDIS_PORT", None),
                ("REDIS_DB", None),
            ],
            || {
                let config = RedisConfig::from_env().unwrap();
                assert_eq!(config.broker_url, "redis://127.0.0.1:6379/0");
                assert_eq!(config.result_store_url, "redis://127.0.0.1:6379/0");
            },
        );
    }

    #[test]
    fn test_redis_config_derives_urls_from_host_port_db() {
        temp_env::with_vars(
            [
                ("BROKER_URL", None::<&str>),
                ("RESULT_STORE_URL", None),
                ("REDIS_HOST", Some("cache.internal")),
                ("REDIS_PORT", Some("6380")),
                ("REDIS_DB", Some("2")),
            ],
            || {
                let config = RedisConfig::from_env().unwrap();
                assert_eq!(config.broker_url, "redis://cache.internal:6380/2");
                assert_eq!(config.result_store_url, "redis://cache.internal:6380/2");
            },
        );
    }

    #[test]
    fn test_redis_config_explicit_urls_win() {
        temp_env::with_vars(
            [
                ("BROKER_URL", Some("redis://broker:6379/1")),
                ("RESULT_STORE_URL", Some("redis://results:6379/3")),
                ("REDIS_HOST", Some("ignored")),
            ],
            || {
                let config = RedisConfig::from_env().unwrap();
                assert_eq!(config.broker_url, "redis://broker:6379/1");
                assert_eq!(config.result_store_url, "redis://results:6379/3");
            },
        );
    }

    #[test]
    fn test_redis_config_invalid_port() {
        temp_env::with_var("REDIS_PORT", Some("not_a_port"), || {
            let result = RedisConfig::from_env();
            assert!(result.is_err());
            assert!(result.unwrap_err().to_string().contains("REDIS_PORT"));
        });
    }

    #[test]
    fn test_redis_config_new_shares_url() {
        let config = RedisConfig::new("redis://prod:6379/0");
        assert_eq!(config.broker_url, config.result_store_url);
    }
}
