//! Notification dispatch.
//!
//! A [`Dispatcher`] takes one composed [`NotificationMessage`] and makes a
//! single delivery attempt. Dispatchers never retry: a failure comes back as
//! a [`DeliveryError`] carrying the undelivered message and the caller
//! decides what to do with it.

pub mod email;
pub mod mock;
pub mod webhook;

use async_trait::async_trait;

use crate::monitor::NotificationMessage;

pub use email::{EmailConfig, EmailDispatcher};
pub use mock::MockDispatcher;
pub use webhook::WebhookDispatcher;

/// A failed delivery attempt.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Failed to deliver \"{}\" to {} via {}: {}", .message.subject, .message.recipient, .channel, .reason)]
pub struct DeliveryError {
    /// The message that was not delivered
    pub message: NotificationMessage,
    /// Name of the dispatcher that failed
    pub channel: String,
    pub reason: String,
}

impl DeliveryError {
    pub fn new(
        message: &NotificationMessage,
        channel: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Self {
            message: message.clone(),
            channel: channel.into(),
            reason: reason.to_string(),
        }
    }
}

/// Outbound delivery capability.
#[async_trait]
pub trait Dispatcher {
    /// Make one delivery attempt for `message`.
    async fn send(&self, message: &NotificationMessage) -> Result<(), DeliveryError>;

    /// Name of this channel for logs and the delivery history.
    fn channel_name(&self) -> &str;
}

/// Dispatcher that only writes messages to the log. Always succeeds.
#[derive(Debug, Default, Clone)]
pub struct LogDispatcher;

#[async_trait]
impl Dispatcher for LogDispatcher {
    async fn send(&self, message: &NotificationMessage) -> Result<(), DeliveryError> {
        tracing::info!(
            recipient = %message.recipient,
            subject = %message.subject,
            "Notification (log channel)"
        );
        tracing::debug!("{}", message.body);
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "log"
    }
}
