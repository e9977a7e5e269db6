//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Storage error: {0}")]
    Storage(#[from] vault_storage::StorageError),

    #[error("{0}")]
    Schema(#[from] vault_storage::SchemaError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
