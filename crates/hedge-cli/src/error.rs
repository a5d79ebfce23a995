use hedge_core::{Failure, FailureKind};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] hedge_core::ValidationError),

    #[error(transparent)]
    Lookup(#[from] Failure),

    #[error(transparent)]
    Warehouse(#[from] hedge_warehouse::WarehouseError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error("timestamp formatting failed: {0}")]
    Timestamp(#[from] time::error::Format),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Lookup(failure) => failure_exit_code(failure.kind()),
            Self::Warehouse(_) => 7,
            Self::Serialization(_) | Self::Timestamp(_) => 8,
            Self::Io(_) => 10,
        }
    }
}

/// Exit code reported when a lookup ends in `kind`.
pub const fn failure_exit_code(kind: FailureKind) -> u8 {
    match kind {
        FailureKind::Timeout => 3,
        FailureKind::Transfer => 4,
        FailureKind::Decode => 5,
        FailureKind::EmptyResult => 6,
    }
}
