//! Vault Core
//!
//! Ties the model, storage and session crates together:
//! - `Config` picks the backend and defaults at startup
//! - `VaultRepository` loads, saves and clears vaults transactionally
//! - `VaultService` runs the open / close protocol for the UI layer

mod config;
mod error;
mod repository;
mod service;

pub use config::Config;
pub use error::VaultError;
pub use repository::{VaultRepository, DEFAULT_PAGE};
pub use service::{CloseOutcome, OpenRequest, OpenedVault, VaultService};

// Re-export the building blocks callers need
pub use vault_model::{
    BytesCodec, CodecError, Container, ItemCodec, JsonItemCodec, ModelError, OwnerId, VaultModel,
};
pub use vault_session::{SessionState, SessionTracker};
pub use vault_storage::{BackendKind, Database, SchemaError, StorageError};

pub type Result<T> = std::result::Result<T, VaultError>;

/// Initialize logging; safe to call more than once
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}
