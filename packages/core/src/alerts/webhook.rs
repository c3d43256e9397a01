//! Webhook notification delivery.
//!
//! Posts each [`NotificationMessage`] as JSON to a single configured URL.
//! One attempt per message: a transport error or a non-2xx status is
//! reported back as a [`DeliveryError`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::alerts::{DeliveryError, Dispatcher};
use crate::monitor::NotificationMessage;

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Error type for webhook transport failures.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),
}

#[derive(Clone)]
pub struct WebhookDispatcher {
    url: String,
    http: Client,
}

impl WebhookDispatcher {
    pub fn new(url: impl Into<String>) -> Result<Self, WebhookError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            url: url.into(),
            http,
        })
    }

    async fn post(&self, message: &NotificationMessage) -> Result<(), WebhookError> {
        let response = self.http.post(&self.url).json(message).send().await?;
        if !response.status().is_success() {
            return Err(WebhookError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl Dispatcher for WebhookDispatcher {
    async fn send(&self, message: &NotificationMessage) -> Result<(), DeliveryError> {
        self.post(message)
            .await
            .map_err(|err| DeliveryError::new(message, self.channel_name(), err))
    }

    fn channel_name(&self) -> &str {
        "webhook"
    }
}
