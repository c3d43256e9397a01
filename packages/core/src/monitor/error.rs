//! Error types for monitor operations

use thiserror::Error;

/// Errors raised while turning a trigger payload into notifications.
///
/// Neither variant is fatal: the caller logs the error and drops the trigger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MonitorError {
    #[error("Missing data: {what}")]
    MissingData { what: String },

    #[error("Malformed record: {message}")]
    MalformedRecord { message: String },
}

impl MonitorError {
    pub fn missing_data(what: impl Into<String>) -> Self {
        Self::MissingData { what: what.into() }
    }

    pub fn malformed_record(message: impl Into<String>) -> Self {
        Self::MalformedRecord { message: message.into() }
    }

    /// Short label used for metrics and API responses.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingData { .. } => "missing_data",
            Self::MalformedRecord { .. } => "malformed_record",
        }
    }
}
