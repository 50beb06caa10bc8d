//! FILENAME: core/table-engine/src/error.rs

use thiserror::Error;

/// Problems found while validating a `TableConfiguration`.
/// These are fatal and surfaced at configure time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("table configuration must declare at least one column")]
    NoColumns,

    #[error("column at index {0} has an empty field name")]
    EmptyFieldName(usize),

    #[error("duplicate column field: {0}")]
    DuplicateField(String),

    #[error("page size must be greater than zero")]
    InvalidPageSize,
}

#[derive(Error, Debug)]
pub enum TableError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Table has not been configured")]
    NotConfigured,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data payload: {0}")]
    InvalidPayload(String),
}

pub type TableResult<T> = Result<T, TableError>;
