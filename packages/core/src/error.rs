use std::error::Error;
use std::fmt;

/// Process-level application error.
///
/// Raised while starting the service (config, database, dispatcher, socket).
/// Per-trigger failures never surface here; they are handled by the pipeline.
#[derive(Debug)]
pub enum AppError {
    Config(String),
    Database(String),
    Dispatcher(String),
    Server(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "Config error: {}", msg),
            AppError::Database(msg) => write!(f, "Database error: {}", msg),
            AppError::Dispatcher(msg) => write!(f, "Dispatcher error: {}", msg),
            AppError::Server(msg) => write!(f, "Server error: {}", msg),
        }
    }
}

impl Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Server(err.to_string())
    }
}
