//! Vault Storage Layer
//!
//! Relational persistence for vaults on SQLite, MySQL or PostgreSQL.
//! One set of primitives runs on every backend; only the dialect differs.
//! All writes happen inside a single transaction per operation.

mod backend;
mod database;
mod dialect;
mod error;
mod schema;
mod server;
mod sqlite;
mod statements;

pub use backend::BackendKind;
pub use database::Database;
pub use dialect::{Dialect, Queries, ITEM_TABLE, META_TABLE};
pub use error::{SchemaError, StorageError};
pub use server::ServerDatabase;
pub use sqlite::SqliteDatabase;
pub use statements::{ItemRecord, MetaRecord, VaultStatements};

pub type Result<T> = std::result::Result<T, StorageError>;

pub(crate) fn slot_param(slot: usize) -> Result<i32> {
    i32::try_from(slot)
        .map_err(|_| StorageError::InvalidData(format!("slot {} out of range", slot)))
}
