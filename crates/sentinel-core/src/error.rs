//! Error types for the IP Sentinel system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for sentinel operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the IP Sentinel system
#[derive(Error, Debug)]
pub enum Error {
    /// All IP resolution providers failed or returned garbage
    #[error("IP resolution error: {0}")]
    Resolution(String),

    /// Disk read/write failure for any persisted file
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Invalid configuration (malformed cron expression, bad credentials shape)
    #[error("configuration error: {0}")]
    Config(String),

    /// Per-channel notification delivery failure
    #[error("notification error ({channel}): {message}")]
    Notification {
        /// Channel name
        channel: String,
        /// Error message
        message: String,
    },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a resolution error
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    /// Create a persistence error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a per-channel notification error
    pub fn notification(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Notification {
            channel: channel.into(),
            message: message.into(),
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
