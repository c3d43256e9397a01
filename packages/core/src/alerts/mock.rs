//! In-memory dispatcher for tests and local wiring.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::alerts::{DeliveryError, Dispatcher};
use crate::monitor::NotificationMessage;

/// Records every message it is given. Optionally fails every send.
#[derive(Debug, Default)]
pub struct MockDispatcher {
    sent: Mutex<Vec<NotificationMessage>>,
    failure: Option<String>,
}

impl MockDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `send` fail with `reason`. Failed messages are still recorded.
    pub fn with_failure(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }

    /// Messages passed to `send`, in call order.
    pub async fn sent(&self) -> Vec<NotificationMessage> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Dispatcher for MockDispatcher {
    async fn send(&self, message: &NotificationMessage) -> Result<(), DeliveryError> {
        self.sent.lock().await.push(message.clone());
        match &self.failure {
            Some(reason) => Err(DeliveryError::new(message, self.channel_name(), reason)),
            None => Ok(()),
        }
    }

    fn channel_name(&self) -> &str {
        "mock"
    }
}
