use thiserror::Error;

use crate::outcome::Failure;

/// Validation and contract errors raised before any lookup starts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid CEP '{value}': expected exactly 8 ASCII digits")]
    InvalidCep { value: String },

    #[error("invalid currency pair '{value}', expected BASE-QUOTE such as USD-BRL")]
    InvalidCurrencyPair { value: String },

    #[error("invalid provider '{value}', expected one of {expected}")]
    InvalidProvider { value: String, expected: String },

    #[error("a race needs at least one provider")]
    EmptyProviderSet,

    #[error("invalid configuration value for {key}: '{value}'")]
    InvalidConfig { key: &'static str, value: String },
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Failure(#[from] Failure),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
