//! SMTP mail transport using lettre.
//!
//! One connection per send: connect, optionally STARTTLS, optionally
//! authenticate, transmit, disconnect. Anticipated failure classes
//! (authentication rejected, recipient refused, connection dropped) and
//! anything unanticipated all degrade to a `Failed` outcome with a logged
//! reason - retry decisions belong to the delivery job, not here.

use super::{MailTransport, SendOutcome};
use crate::error::{CampaignError, CampaignResult};
use crate::models::EmailMessage;
use async_trait::async_trait;
use core_config::{env_or_default, ConfigError, FromEnv};
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use tracing::{debug, error, info};

/// SMTP relay configuration.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// SMTP server host.
    pub host: String,
    /// SMTP server port.
    pub port: u16,
    /// Default sender address when a message carries none.
    pub from_email: String,
    /// SMTP username (optional for dev relays like Mailpit).
    pub username: Option<String>,
    /// SMTP password.
    pub password: Option<String>,
    /// Negotiate STARTTLS (off for local dev relays).
    pub use_tls: bool,
}

impl SmtpConfig {
    pub fn new(host: String, port: u16, from_email: String) -> Self {
        Self {
            host,
            port,
            from_email,
            username: None,
            password: None,
            use_tls: false,
        }
    }

    /// Builder method to set TLS.
    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    /// Builder method to set credentials.
    pub fn with_credentials(mut self, username: String, password: String) -> Self {
        self.username = Some(username);
        self.password = Some(password);
        self
    }
}

impl FromEnv for SmtpConfig {
    /// Environment variables:
    /// - `SMTP_HOST` (default "smtp.gmail.com"), `SMTP_PORT` (default 587)
    /// - `SMTP_USER` / `SMTP_PASS` (blank means unauthenticated)
    /// - `SMTP_USE_TLS` (default true)
    /// - `SMTP_FROM_EMAIL` (defaults to `SMTP_USER`)
    fn from_env() -> Result<Self, ConfigError> {
        let host = env_or_default("SMTP_HOST", "smtp.gmail.com");
        let port: u16 = env_or_default("SMTP_PORT", "587")
            .parse()
            .map_err(|e| ConfigError::ParseError {
                key: "SMTP_PORT".to_string(),
                details: format!("{}", e),
            })?;

        let username = Some(env_or_default("SMTP_USER", "")).filter(|u| !u.is_empty());
        let password = Some(env_or_default("SMTP_PASS", "")).filter(|p| !p.is_empty());

        let use_tls = {
            let raw = env_or_default("SMTP_USE_TLS", "true");
            raw == "true" || raw == "1"
        };

        let from_email = {
            let explicit = env_or_default("SMTP_FROM_EMAIL", "");
            if !explicit.is_empty() {
                explicit
            } else {
                username
                    .clone()
                    .unwrap_or_else(|| "no-reply@localhost".to_string())
            }
        };

        Ok(Self {
            host,
            port,
            from_email,
            username,
            password,
            use_tls,
        })
    }
}

/// SMTP mail transport.
pub struct SmtpTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    config: Arc<SmtpConfig>,
}

impl SmtpTransport {
    /// Create a new SMTP transport from configuration.
    pub fn new(config: SmtpConfig) -> CampaignResult<Self> {
        let transport = Self::build_transport(&config)?;
        Ok(Self {
            transport,
            config: Arc::new(config),
        })
    }

    /// Build the lettre transport based on configuration.
    fn build_transport(
        config: &SmtpConfig,
    ) -> CampaignResult<AsyncSmtpTransport<Tokio1Executor>> {
        let mut builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| {
                    CampaignError::TransportError(format!("Failed to create SMTP relay: {}", e))
                })?
                .port(config.port)
        } else {
            // Plaintext transport for local dev relays
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host).port(config.port)
        };

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(builder.build())
    }

    /// Build a lettre Message with From/To/Subject headers and a
    /// plain-text body.
    fn build_message(&self, message: &EmailMessage) -> Result<Message, String> {
        let from_address = message
            .from_email
            .as_deref()
            .unwrap_or(&self.config.from_email);
        let from: Mailbox = from_address
            .parse()
            .map_err(|e| format!("invalid from address '{}': {}", from_address, e))?;

        let to: Mailbox = message
            .to
            .parse()
            .map_err(|e| format!("invalid to address '{}': {}", message.to, e))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(&message.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| format!("failed to build message: {}", e))
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn send(&self, message: &EmailMessage) -> SendOutcome {
        debug!(
            to = %message.to,
            subject = %message.subject,
            host = %self.config.host,
            port = %self.config.port,
            "Sending email via SMTP"
        );

        let mail = match self.build_message(message) {
            Ok(mail) => mail,
            Err(reason) => {
                error!(to = %message.to, reason = %reason, "Failed to build email message");
                return SendOutcome::failed(reason);
            }
        };

        match self.transport.send(mail).await {
            Ok(response) => {
                let relay_reply = response.message().next().map(|s| s.to_string());
                info!(
                    to = %message.to,
                    relay_reply = ?relay_reply,
                    "Email accepted by relay"
                );
                SendOutcome::Accepted
            }
            Err(e) => {
                // Auth rejections, refused recipients, dropped connections
                // and anything else all land here
                error!(to = %message.to, error = %e, "Failed to send email via SMTP");
                SendOutcome::failed(format!("SMTP send failed: {}", e))
            }
        }
    }

    fn name(&self) -> &'static str {
        "SMTP"
    }

    async fn health_check(&self) -> bool {
        match self.transport.test_connection().await {
            Ok(ok) => ok,
            Err(e) => {
                error!(error = %e, "SMTP health check failed");
                false
            }
        }
    }
}

// AsyncSmtpTransport does not implement Clone; rebuild from config
impl Clone for SmtpTransport {
    fn clone(&self) -> Self {
        let transport = Self::build_transport(&self.config)
            .unwrap_or_else(|_| {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.config.host)
                    .port(self.config.port)
                    .build()
            });
        Self {
            transport,
            config: Arc::clone(&self.config),
        }
    }
}
