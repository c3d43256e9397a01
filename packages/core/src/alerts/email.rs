//! Email notification delivery via SMTP.
//!
//! [`EmailDispatcher`] wraps the `lettre` async SMTP transport to send
//! plain-text notifications. Configuration is loaded from environment
//! variables; if `SMTP_HOST` is not set, [`EmailConfig::from_env`] returns
//! `None` and no mailer should be constructed.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::alerts::{DeliveryError, Dispatcher};
use crate::monitor::NotificationMessage;

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "Kiosk Alerts <noreply@kiosk-alerts.local>";

/// Configuration for the SMTP dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// RFC 5322 "From" mailbox, display name allowed
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable        | Required | Default                                      |
    /// |-----------------|----------|----------------------------------------------|
    /// | `SMTP_HOST`     | yes      | none                                         |
    /// | `SMTP_PORT`     | no       | `587`                                        |
    /// | `SMTP_FROM`     | no       | `Kiosk Alerts <noreply@kiosk-alerts.local>`  |
    /// | `SMTP_USER`     | no       | none                                         |
    /// | `SMTP_PASSWORD` | no       | none                                         |
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EmailConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let smtp_host = lookup("SMTP_HOST")?;
        Some(Self {
            smtp_host,
            smtp_port: lookup("SMTP_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: lookup("SMTP_FROM").unwrap_or_else(|| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: lookup("SMTP_USER"),
            smtp_password: lookup("SMTP_PASSWORD"),
        })
    }
}

/// Sends notifications as plain-text email.
pub struct EmailDispatcher {
    from: Mailbox,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailDispatcher {
    /// Build the SMTP transport. No connection is opened until the first send.
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let from: Mailbox = config.from_address.parse()?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
                .port(config.smtp_port);

        if let (Some(user), Some(pass)) = (&config.smtp_user, &config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            from,
            mailer: transport_builder.build(),
        })
    }

    fn build_message(&self, message: &NotificationMessage) -> Result<Message, EmailError> {
        Message::builder()
            .from(self.from.clone())
            .to(message.recipient.parse()?)
            .subject(message.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| EmailError::Build(e.to_string()))
    }

    async fn deliver(&self, message: &NotificationMessage) -> Result<(), EmailError> {
        let email = self.build_message(message)?;
        self.mailer.send(email).await?;

        tracing::info!(
            to = %message.recipient,
            subject = %message.subject,
            "Notification email sent"
        );
        Ok(())
    }
}

#[async_trait]
impl Dispatcher for EmailDispatcher {
    async fn send(&self, message: &NotificationMessage) -> Result<(), DeliveryError> {
        self.deliver(message)
            .await
            .map_err(|err| DeliveryError::new(message, self.channel_name(), err))
    }

    fn channel_name(&self) -> &str {
        "smtp"
    }
}
