//! Dispatcher error types

use contracts::OutputChannel;
use thiserror::Error;
use translator::DecodeError;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Sink creation error
    #[error("failed to create sink for '{topic}': {message}")]
    SinkCreation { topic: String, message: String },

    /// No output was built for a channel
    #[error("no output configured for channel {0}")]
    MissingChannel(OutputChannel),

    /// Sink write error (from contract)
    #[error("sink error: {0}")]
    Contract(#[from] contracts::ContractError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatcherError {
    /// Create a sink creation error
    pub fn sink_creation(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            topic: topic.into(),
            message: message.into(),
        }
    }
}

/// Per-tick bridge errors
///
/// Only decoding can fail a tick. Publish failures are reported in the
/// `TickReport` and never abort the remaining ports.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("state decode failed: {0}")]
    Decode(#[from] DecodeError),
}
