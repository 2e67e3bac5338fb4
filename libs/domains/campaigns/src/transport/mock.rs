//! Scripted mail transport for tests.

use super::{MailTransport, SendOutcome};
use crate::models::EmailMessage;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use tracing::debug;

/// Mail transport with scripted outcomes.
///
/// Pops outcomes from a queue in order; once the queue is exhausted every
/// further send returns the fallback outcome. Records every send.
pub struct MockTransport {
    scripted: Mutex<VecDeque<SendOutcome>>,
    fallback: SendOutcome,
    sends: AtomicU32,
}

impl MockTransport {
    /// Transport that accepts every message.
    pub fn accepting() -> Self {
        Self {
            scripted: Mutex::new(VecDeque::new()),
            fallback: SendOutcome::Accepted,
            sends: AtomicU32::new(0),
        }
    }

    /// Transport that fails every message with the given reason.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            scripted: Mutex::new(VecDeque::new()),
            fallback: SendOutcome::failed(reason),
            sends: AtomicU32::new(0),
        }
    }

    /// Transport that fails the first `failures` sends, then accepts.
    pub fn failing_first(failures: usize, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let scripted = (0..failures)
            .map(|_| SendOutcome::failed(reason.clone()))
            .collect();
        Self {
            scripted: Mutex::new(scripted),
            fallback: SendOutcome::Accepted,
            sends: AtomicU32::new(0),
        }
    }

    /// Number of send attempts observed so far.
    pub fn send_count(&self) -> u32 {
        self.sends.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MailTransport for MockTransport {
    async fn send(&self, message: &EmailMessage) -> SendOutcome {
        self.sends.fetch_add(1, Ordering::SeqCst);

        let outcome = self
            .scripted
            .lock()
            .expect("mock transport lock poisoned")
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        debug!(to = %message.to, outcome = ?outcome, "Mock transport send");
        outcome
    }

    fn name(&self) -> &'static str {
        "Mock"
    }

    async fn health_check(&self) -> bool {
        true
    }
}
