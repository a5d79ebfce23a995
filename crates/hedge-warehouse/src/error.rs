use thiserror::Error;

#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("write abandoned before commit: {0}")]
    Abandoned(String),

    #[error("warehouse connection lock poisoned")]
    Poisoned,
}
