//! Error types for the screen impact engine

use thiserror::Error;

/// Errors raised by the normalizer when a submission cannot be scored
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Child age {age} is outside the supported range {min}-{max}")]
    AgeOutOfRange { age: i64, min: u8, max: u8 },

    #[error("Invalid submission shape: {0}")]
    InvalidShape(String),
}

/// Errors that can occur while computing or encoding an impact result
#[derive(Debug, Error)]
pub enum ImpactError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid reference data: {0}")]
    InvalidReference(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

impl ImpactError {
    /// True when the caller should re-prompt the user rather than report a fault
    pub fn is_validation(&self) -> bool {
        matches!(self, ImpactError::Validation(_))
    }
}
