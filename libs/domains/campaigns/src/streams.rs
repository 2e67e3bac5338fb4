//! Stream definitions for the campaigns domain.

use stream_worker::StreamDef;

/// Delivery jobs stream definition.
///
/// Shared by the API (producer side) and the email worker (consumer side).
pub struct EmailStream;

impl StreamDef for EmailStream {
    /// Stream name for delivery jobs.
    const STREAM_NAME: &'static str = "email:jobs";

    /// Consumer group for email workers.
    const CONSUMER_GROUP: &'static str = "email_workers";

    /// Dead letter queue for terminally failed jobs.
    const DLQ_STREAM: &'static str = "email:dlq";

    /// Maximum stream length (100k entries).
    const MAX_LENGTH: i64 = 100_000;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_stream_def() {
        assert_eq!(EmailStream::stream_name(), "email:jobs");
        assert_eq!(EmailStream::consumer_group(), "email_workers");
        assert_eq!(EmailStream::dlq_stream(), "email:dlq");
        assert_eq!(EmailStream::MAX_LENGTH, 100_000);
    }
}
