//! Error types for input validation

use thiserror::Error;

/// Result type alias for validation
pub type Result<T> = std::result::Result<T, ValidationError>;

/// A configured input option was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid threshold {value:?}, needs to be a positive decimal number")]
    InvalidThreshold { value: String },

    #[error("Invalid max_runtime {value:?}, needs to be a positive decimal number (minutes)")]
    InvalidMaxRuntime { value: String },
}

impl ValidationError {
    /// Name of the offending input field
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::InvalidThreshold { .. } => "threshold",
            ValidationError::InvalidMaxRuntime { .. } => "max_runtime",
        }
    }

    /// The raw value that was rejected
    pub fn value(&self) -> &str {
        match self {
            ValidationError::InvalidThreshold { value }
            | ValidationError::InvalidMaxRuntime { value } => value,
        }
    }
}
