//! Error types for the report service

use lockin_engine::LockEngineError;
use thiserror::Error;

/// Result type for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors that can occur while building or publishing the report
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Upstream data unavailable ({table}): {reason}")]
    UpstreamDataUnavailable { table: String, reason: String },

    #[error("Engine error: {0}")]
    Engine(#[from] LockEngineError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ServiceError {
    /// Create a new upstream-data error
    pub fn upstream(table: impl Into<String>, reason: impl ToString) -> Self {
        Self::UpstreamDataUnavailable { table: table.into(), reason: reason.to_string() }
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
