//! Vault schema
//!
//! Two relations, created with IF NOT EXISTS so startup can always run this:
//! - `vault_meta`: one row per owner (rows, title, updated_at)
//! - `vault_item`: one row per occupied slot, keyed by (owner_id, page, slot)
//!
//! Items relate to meta by owner_id only; the link is not enforced.

use crate::database::Database;
use crate::error::SchemaError;

pub fn ensure_schema(db: &Database) -> Result<(), SchemaError> {
    let backend = db.backend();
    let dialect = backend.dialect();
    let statements = [dialect.create_meta_table(), dialect.create_item_table()];

    let result = match db {
        Database::Sqlite(inner) => inner.execute_ddl(&statements),
        Database::Server(inner) => inner.execute_ddl(&statements),
    };

    match result {
        Ok(()) => {
            tracing::info!(
                backend = %backend,
                binary_type = dialect.binary_type(),
                "Vault schema ensured"
            );
            Ok(())
        }
        Err(source) => {
            tracing::warn!(backend = %backend, error = %source, "Vault schema ensure failed");
            Err(SchemaError { backend, source })
        }
    }
}
