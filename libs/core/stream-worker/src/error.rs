//! Stream error types and error categorization
//!
//! Errors are categorized to determine retry behavior:
//! - **Transient**: Temporary failures, retried with exponential backoff
//! - **Permanent**: Unrecoverable errors, terminal failure without retry

use thiserror::Error;

/// Category of error for determining retry behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Temporary failure - retry with exponential backoff
    Transient,
    /// Unrecoverable error - fail the job immediately
    Permanent,
}

impl ErrorCategory {
    /// Whether errors of this category are eligible for retry at all
    pub fn should_retry(&self) -> bool {
        matches!(self, ErrorCategory::Transient)
    }
}

/// Stream processing errors
#[derive(Error, Debug)]
pub enum StreamError {
    /// Redis connection or command error
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Job processing failed
    #[error("Processing error: {message}")]
    Processing {
        message: String,
        category: ErrorCategory,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StreamError {
    /// Create a transient processing error
    pub fn transient(message: impl Into<String>) -> Self {
        StreamError::Processing {
            message: message.into(),
            category: ErrorCategory::Transient,
        }
    }

    /// Create a permanent processing error
    pub fn permanent(message: impl Into<String>) -> Self {
        StreamError::Processing {
            message: message.into(),
            category: ErrorCategory::Permanent,
        }
    }

    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            StreamError::Redis(_) => ErrorCategory::Transient,
            StreamError::Serialization(_) => ErrorCategory::Permanent,
            StreamError::Processing { category, .. } => *category,
            StreamError::Config(_) => ErrorCategory::Permanent,
            StreamError::Internal(_) => ErrorCategory::Permanent,
        }
    }

    /// Check if this looks like a Redis connection failure
    pub fn is_connection_error(&self) -> bool {
        let lower = self.to_string().to_lowercase();
        lower.contains("connection")
            || lower.contains("disconnected")
            || lower.contains("broken pipe")
            || lower.contains("reset by peer")
            || lower.contains("refused")
            || lower.contains("timed out")
            || lower.contains("io error")
    }

    /// Check if the consumer group is missing (NOGROUP reply)
    pub fn is_nogroup_error(&self) -> bool {
        self.to_string().contains("NOGROUP")
    }
}

impl From<serde_json::Error> for StreamError {
    fn from(err: serde_json::Error) -> Self {
        StreamError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert!(ErrorCategory::Transient.should_retry());
        assert!(!ErrorCategory::Permanent.should_retry());
    }

    #[test]
    fn test_transient_and_permanent_constructors() {
        let transient = StreamError::transient("smtp relay unreachable");
        assert_eq!(transient.category(), ErrorCategory::Transient);

        let permanent = StreamError::permanent("invalid recipient");
        assert_eq!(permanent.category(), ErrorCategory::Permanent);
    }

    #[test]
    fn test_serialization_errors_are_permanent() {
        let err: StreamError = serde_json::from_str::<serde_json::Value>("not-json")
            .unwrap_err()
            .into();
        assert_eq!(err.category(), ErrorCategory::Permanent);
    }

    #[test]
    fn test_connection_error_detection() {
        let err = StreamError::Internal("Connection refused by server".to_string());
        assert!(err.is_connection_error());

        let err = StreamError::Internal("something else".to_string());
        assert!(!err.is_connection_error());
    }
}
