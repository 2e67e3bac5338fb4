//! Email Worker Service - Entry Point
//!
//! Background worker that processes delivery jobs from the Redis stream.

#[tokio::main]
async fn main() -> eyre::Result<()> {
    bulkmailer_email_worker::run().await
}
