//! Decode error types

use thiserror::Error;

/// Malformed state line
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// Wrong number of whitespace-separated tokens
    #[error("expected {expected} fields, found {found}")]
    WrongFieldCount { expected: usize, found: usize },

    /// Token is not a number
    #[error("field {index} ({field}) is not a number: '{token}'")]
    InvalidNumber {
        index: usize,
        field: &'static str,
        token: String,
    },

    /// Token parsed but is NaN or infinite
    #[error("field {index} ({field}) is not finite")]
    NonFinite { index: usize, field: &'static str },
}

impl DecodeError {
    /// Short reason label (used for logging/metrics)
    pub fn reason(&self) -> &'static str {
        match self {
            Self::WrongFieldCount { .. } => "field_count",
            Self::InvalidNumber { .. } => "invalid_number",
            Self::NonFinite { .. } => "non_finite",
        }
    }
}
