//! Database handle
//!
//! One cloneable handle over whichever backend was selected at startup.
//! Clones share the underlying connection or pool; nothing here ever closes it
//! early.

use std::path::Path;

use crate::backend::BackendKind;
use crate::error::SchemaError;
use crate::schema;
use crate::server::ServerDatabase;
use crate::sqlite::SqliteDatabase;
use crate::statements::VaultStatements;
use crate::Result;

#[derive(Debug, Clone)]
pub enum Database {
    Sqlite(SqliteDatabase),
    Server(ServerDatabase),
}

impl Database {
    /// Open (or create) the embedded database file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Database::Sqlite(SqliteDatabase::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Database::Sqlite(SqliteDatabase::open_in_memory()?))
    }

    /// Connect a pool to a MySQL or PostgreSQL server
    pub fn connect(backend: BackendKind, url: &str, max_connections: u32) -> Result<Self> {
        Ok(Database::Server(ServerDatabase::connect(
            backend,
            url,
            max_connections,
        )?))
    }

    pub fn backend(&self) -> BackendKind {
        match self {
            Database::Sqlite(_) => BackendKind::Sqlite,
            Database::Server(db) => db.backend(),
        }
    }

    /// Create the vault relations if missing; safe to call on every startup
    pub fn ensure_schema(&self) -> std::result::Result<(), SchemaError> {
        schema::ensure_schema(self)
    }

    pub fn read<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn VaultStatements) -> Result<T>,
    {
        match self {
            Database::Sqlite(db) => db.read(f),
            Database::Server(db) => db.read(f),
        }
    }

    pub fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn VaultStatements) -> Result<T>,
    {
        match self {
            Database::Sqlite(db) => db.transaction(f),
            Database::Server(db) => db.transaction(f),
        }
    }
}
