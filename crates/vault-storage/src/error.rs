//! Storage error types

use thiserror::Error;

use crate::backend::BackendKind;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("Runtime error: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

/// DDL failure while ensuring the vault relations exist
#[derive(Error, Debug)]
#[error("Schema setup failed on {backend}: {source}")]
pub struct SchemaError {
    pub backend: BackendKind,
    #[source]
    pub source: StorageError,
}
