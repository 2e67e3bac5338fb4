//! Mail transport implementations.
//!
//! The transport is a pure I/O boundary: it reports the outcome of one
//! send as a value and never lets transport-internal errors escape. The
//! delivery job alone decides what a failure means (retry vs. give up).

mod mock;
mod smtp;

pub use mock::MockTransport;
pub use smtp::{SmtpConfig, SmtpTransport};

use crate::models::EmailMessage;
use async_trait::async_trait;

/// Outcome of one send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The relay accepted the message for delivery.
    Accepted,
    /// The send failed; the reason is for logs and failure payloads.
    Failed { reason: String },
}

impl SendOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        SendOutcome::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, SendOutcome::Accepted)
    }
}

/// Trait for mail transports.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Send one message. Opens a connection, transmits, and disconnects;
    /// no partial state survives the call.
    async fn send(&self, message: &EmailMessage) -> SendOutcome;

    /// Get the transport name for logging.
    fn name(&self) -> &'static str;

    /// Check whether the transport is reachable/configured.
    async fn health_check(&self) -> bool;
}
