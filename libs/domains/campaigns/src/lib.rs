//! Campaigns Domain
//!
//! Bulk email delivery: validate recipients, fan a campaign out into one
//! delivery job per recipient, and report job status back to callers.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   API Handler   │  ← Validates request, filters recipients
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │ CampaignService │  ← One job per recipient onto the Redis stream
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │   Redis Stream  │  ← email:jobs queue + task:* status records
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │  Email Worker   │  ← Retries with backoff, records outcome
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │  Mail Transport │  ← SMTP relay via lettre
//! └─────────────────┘
//! ```

pub mod error;
pub mod handlers;
pub mod models;
pub mod processor;
pub mod service;
pub mod streams;
pub mod transport;
pub mod validator;

// Re-export commonly used types
pub use error::{CampaignError, CampaignResult};
pub use handlers::ApiDoc;
pub use models::{
    DeliveryJob, EmailCampaign, EmailMessage, MessageStatus, SendEmailsRequest,
    SendEmailsResponse, TaskStatusResponse,
};
pub use processor::DeliveryProcessor;
pub use service::CampaignService;
pub use streams::EmailStream;
pub use transport::{MailTransport, MockTransport, SendOutcome, SmtpConfig, SmtpTransport};
