//! Ingestion error types

use thiserror::Error;

/// Ingestion errors
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Socket could not be bound
    #[error("failed to bind '{addr}' for topic {topic}: {source}")]
    Bind {
        topic: String,
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Replay file could not be read
    #[error("failed to read replay file '{path}': {source}")]
    ReplayRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Source parameter missing or malformed
    #[error("invalid source parameter '{param}': {message}")]
    InvalidParam { param: String, message: String },

    /// Source already running
    #[error("source {topic} is already running")]
    AlreadyRunning { topic: String },

    /// Pipeline already started (sender consumed)
    #[error("ingestion pipeline already started")]
    AlreadyStarted,
}

impl IngestionError {
    pub fn invalid_param(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParam {
            param: param.into(),
            message: message.into(),
        }
    }
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
