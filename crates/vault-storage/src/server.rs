//! Client/server backends (MySQL, PostgreSQL)
//!
//! Both engines go through one sqlx `Any` pool; the dialect only changes the
//! SQL text. The pool is driven by a private tokio runtime so the public API
//! stays synchronous. Do not call into it from inside another async runtime.

use sqlx::any::{Any, AnyPoolOptions, AnyRow};
use sqlx::{AnyConnection, AnyPool, Row};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

use crate::backend::BackendKind;
use crate::dialect::{Dialect, Queries};
use crate::error::StorageError;
use crate::statements::{ItemRecord, MetaRecord, VaultStatements};
use crate::{slot_param, Result};

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub struct ServerDatabase {
    pool: AnyPool,
    runtime: Arc<Runtime>,
    backend: BackendKind,
    queries: Arc<Queries>,
}

impl ServerDatabase {
    pub fn connect(backend: BackendKind, url: &str, max_connections: u32) -> Result<Self> {
        check_url_matches(backend, url)?;
        sqlx::any::install_default_drivers();

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("vault-sql")
            .enable_all()
            .build()?;

        let pool = runtime.block_on(
            AnyPoolOptions::new()
                .max_connections(max_connections.max(1))
                .acquire_timeout(ACQUIRE_TIMEOUT)
                .connect(url),
        )?;

        tracing::info!(backend = %backend, max_connections, "Connected to database");

        Ok(Self {
            pool,
            runtime: Arc::new(runtime),
            backend,
            queries: Arc::new(Queries::for_dialect(backend.dialect())),
        })
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    pub fn dialect(&self) -> Dialect {
        self.backend.dialect()
    }

    /// Run primitives on one pooled connection in autocommit mode
    pub fn read<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn VaultStatements) -> Result<T>,
    {
        let mut conn = self.runtime.block_on(self.pool.acquire())?;
        let mut statements = ServerStatements {
            conn: &mut *conn,
            runtime: self.runtime.as_ref(),
            queries: &self.queries,
        };
        f(&mut statements)
    }

    /// Run primitives in one transaction, rolled back on error
    pub fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn VaultStatements) -> Result<T>,
    {
        let mut tx = self.runtime.block_on(self.pool.begin())?;
        let result = {
            let mut statements = ServerStatements {
                conn: &mut *tx,
                runtime: self.runtime.as_ref(),
                queries: &self.queries,
            };
            f(&mut statements)
        };

        match result {
            Ok(value) => {
                self.runtime.block_on(tx.commit())?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self.runtime.block_on(tx.rollback()) {
                    tracing::warn!(backend = %self.backend, error = %rollback, "Rollback failed");
                }
                Err(e)
            }
        }
    }

    pub(crate) fn execute_ddl(&self, statements: &[String]) -> Result<()> {
        self.transaction_raw(|conn, runtime| {
            for sql in statements {
                runtime.block_on(sqlx::raw_sql(sql).execute(&mut *conn))?;
            }
            Ok(())
        })
    }

    fn transaction_raw<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut AnyConnection, &Runtime) -> Result<()>,
    {
        let mut tx = self.runtime.block_on(self.pool.begin())?;
        f(&mut *tx, self.runtime.as_ref())?;
        self.runtime.block_on(tx.commit())?;
        Ok(())
    }
}

impl Clone for ServerDatabase {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            runtime: Arc::clone(&self.runtime),
            backend: self.backend,
            queries: Arc::clone(&self.queries),
        }
    }
}

/// The `Any` driver is picked from the URL scheme, so it must agree with the backend
fn check_url_matches(backend: BackendKind, url: &str) -> Result<()> {
    let scheme = url.split(':').next().unwrap_or_default().to_lowercase();
    let ok = match backend {
        BackendKind::MySql => matches!(scheme.as_str(), "mysql" | "mariadb"),
        BackendKind::PostgreSql => matches!(scheme.as_str(), "postgres" | "postgresql"),
        BackendKind::Sqlite => false,
    };

    if ok {
        Ok(())
    } else {
        Err(StorageError::Config(format!(
            "database url scheme `{}` does not match backend {}",
            scheme, backend
        )))
    }
}

fn page_param(page: u32) -> Result<i32> {
    i32::try_from(page).map_err(|_| StorageError::InvalidData(format!("page {} out of range", page)))
}

fn meta_from_row(row: &AnyRow) -> Result<MetaRecord> {
    Ok(MetaRecord {
        rows: row.try_get(0)?,
        title: text_column(row, 1)?,
    })
}

fn item_from_row(owner_id: &str, row: &AnyRow) -> Result<Option<ItemRecord>> {
    let slot: i64 = row.try_get(0)?;
    Ok(ItemRecord::from_columns(owner_id, slot, payload_column(owner_id, row, 1)))
}

/// MySQL reports `TEXT` columns as blobs, so text may arrive either way
fn text_column(row: &AnyRow, index: usize) -> Result<Option<String>> {
    match row.try_get::<Option<String>, _>(index) {
        Ok(text) => Ok(text),
        Err(_) => {
            let bytes: Option<Vec<u8>> = row.try_get(index)?;
            bytes
                .map(|b| {
                    String::from_utf8(b).map_err(|e| {
                        StorageError::InvalidData(format!("column {} is not UTF-8: {}", index, e))
                    })
                })
                .transpose()
        }
    }
}

/// Payloads the driver cannot read as bytes decode to "absent" later on
fn payload_column(owner_id: &str, row: &AnyRow, index: usize) -> Vec<u8> {
    match row.try_get::<Vec<u8>, _>(index) {
        Ok(bytes) => bytes,
        Err(e) => match row.try_get::<String, _>(index) {
            Ok(text) => text.into_bytes(),
            Err(_) => {
                tracing::debug!(owner_id = %owner_id, error = %e, "Unreadable payload column");
                Vec::new()
            }
        },
    }
}

struct ServerStatements<'c> {
    conn: &'c mut AnyConnection,
    runtime: &'c Runtime,
    queries: &'c Queries,
}

impl VaultStatements for ServerStatements<'_> {
    fn select_meta(&mut self, owner_id: &str) -> Result<Option<MetaRecord>> {
        let row = self.runtime.block_on(
            sqlx::query::<Any>(&self.queries.select_meta)
                .bind(owner_id)
                .fetch_optional(&mut *self.conn),
        )?;

        row.as_ref().map(meta_from_row).transpose()
    }

    fn select_items(&mut self, owner_id: &str, page: u32) -> Result<Vec<ItemRecord>> {
        let rows = self.runtime.block_on(
            sqlx::query::<Any>(&self.queries.select_items)
                .bind(owner_id)
                .bind(page_param(page)?)
                .fetch_all(&mut *self.conn),
        )?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            items.extend(item_from_row(owner_id, row)?);
        }
        Ok(items)
    }

    fn upsert_meta(&mut self, owner_id: &str, rows: u8, title: Option<&str>) -> Result<()> {
        self.runtime.block_on(
            sqlx::query::<Any>(&self.queries.upsert_meta)
                .bind(owner_id)
                .bind(i32::from(rows))
                .bind(title)
                .execute(&mut *self.conn),
        )?;
        Ok(())
    }

    fn delete_page_items(&mut self, owner_id: &str, page: u32) -> Result<u64> {
        let result = self.runtime.block_on(
            sqlx::query::<Any>(&self.queries.delete_page_items)
                .bind(owner_id)
                .bind(page_param(page)?)
                .execute(&mut *self.conn),
        )?;
        Ok(result.rows_affected())
    }

    fn delete_owner_items(&mut self, owner_id: &str) -> Result<u64> {
        let result = self.runtime.block_on(
            sqlx::query::<Any>(&self.queries.delete_owner_items)
                .bind(owner_id)
                .execute(&mut *self.conn),
        )?;
        Ok(result.rows_affected())
    }

    fn delete_meta(&mut self, owner_id: &str) -> Result<u64> {
        let result = self.runtime.block_on(
            sqlx::query::<Any>(&self.queries.delete_meta)
                .bind(owner_id)
                .execute(&mut *self.conn),
        )?;
        Ok(result.rows_affected())
    }

    fn insert_item(&mut self, owner_id: &str, page: u32, item: &ItemRecord) -> Result<()> {
        self.runtime.block_on(
            sqlx::query::<Any>(&self.queries.insert_item)
                .bind(owner_id)
                .bind(page_param(page)?)
                .bind(slot_param(item.slot)?)
                .bind(item.payload.clone())
                .execute(&mut *self.conn),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::any::{AnyTypeInfo, AnyTypeInfoKind, AnyValue};
    use sqlx_core::any::{AnyColumn, AnyValueKind};
    use sqlx_core::ext::ustr::UStr;
    use std::borrow::Cow;

    /// Row shaped the way the `Any` driver hands it back
    fn any_row(columns: Vec<(&'static str, AnyTypeInfoKind, AnyValueKind<'static>)>) -> AnyRow {
        let mut names = sqlx_core::HashMap::default();
        let mut cols = Vec::new();
        let mut values = Vec::new();

        for (ordinal, (name, kind, value)) in columns.into_iter().enumerate() {
            names.insert(UStr::new(name), ordinal);
            cols.push(AnyColumn {
                ordinal,
                name: UStr::new(name),
                type_info: AnyTypeInfo { kind },
            });
            values.push(AnyValue { kind: value });
        }

        AnyRow {
            column_names: Arc::new(names),
            columns: cols,
            values,
        }
    }

    fn meta_row(title: AnyValueKind<'static>, title_kind: AnyTypeInfoKind) -> AnyRow {
        any_row(vec![
            ("rows", AnyTypeInfoKind::Integer, AnyValueKind::Integer(2)),
            ("title", title_kind, title),
        ])
    }

    fn item_row(slot: i32, payload: AnyValueKind<'static>, kind: AnyTypeInfoKind) -> AnyRow {
        any_row(vec![
            ("slot", AnyTypeInfoKind::Integer, AnyValueKind::Integer(slot)),
            ("payload", kind, payload),
        ])
    }

    #[test]
    fn test_mysql_text_title_arrives_as_blob() {
        let row = meta_row(
            AnyValueKind::Blob(Cow::Owned(b"Vault".to_vec())),
            AnyTypeInfoKind::Blob,
        );
        let meta = meta_from_row(&row).unwrap();
        assert_eq!(meta.rows, 2);
        assert_eq!(meta.title.as_deref(), Some("Vault"));
    }

    #[test]
    fn test_postgres_text_title() {
        let row = meta_row(
            AnyValueKind::Text(Cow::Owned("Bank".to_string())),
            AnyTypeInfoKind::Text,
        );
        assert_eq!(meta_from_row(&row).unwrap().title.as_deref(), Some("Bank"));
    }

    #[test]
    fn test_null_title() {
        for kind in [AnyTypeInfoKind::Text, AnyTypeInfoKind::Blob] {
            let row = meta_row(AnyValueKind::Null(kind), AnyTypeInfoKind::Null);
            assert_eq!(meta_from_row(&row).unwrap().title, None);
        }
    }

    #[test]
    fn test_non_utf8_title_is_rejected() {
        let row = meta_row(
            AnyValueKind::Blob(Cow::Owned(vec![0xff, 0xfe])),
            AnyTypeInfoKind::Blob,
        );
        assert!(matches!(meta_from_row(&row), Err(StorageError::InvalidData(_))));
    }

    #[test]
    fn test_bigint_rows_column() {
        let row = any_row(vec![
            ("rows", AnyTypeInfoKind::BigInt, AnyValueKind::BigInt(4)),
            ("title", AnyTypeInfoKind::Text, AnyValueKind::Text(Cow::Borrowed("Vault"))),
        ]);
        assert_eq!(meta_from_row(&row).unwrap().rows, 4);
    }

    #[test]
    fn test_blob_payload_for_both_engines() {
        // LONGBLOB on MySQL and BYTEA on PostgreSQL both map to a blob
        let row = item_row(
            17,
            AnyValueKind::Blob(Cow::Owned(vec![1, 2, 3])),
            AnyTypeInfoKind::Blob,
        );
        let item = item_from_row("owner", &row).unwrap().unwrap();
        assert_eq!(item.slot, 17);
        assert_eq!(item.payload, vec![1, 2, 3]);
    }

    #[test]
    fn test_text_payload_is_kept_as_bytes() {
        let row = item_row(
            3,
            AnyValueKind::Text(Cow::Borrowed("text")),
            AnyTypeInfoKind::Text,
        );
        let item = item_from_row("owner", &row).unwrap().unwrap();
        assert_eq!(item.payload, b"text".to_vec());
    }

    #[test]
    fn test_unreadable_payload_becomes_empty() {
        let row = item_row(4, AnyValueKind::Double(1.5), AnyTypeInfoKind::Double);
        let item = item_from_row("owner", &row).unwrap().unwrap();
        assert!(item.payload.is_empty());
    }

    #[test]
    fn test_negative_slot_row_is_skipped() {
        let row = item_row(
            -1,
            AnyValueKind::Blob(Cow::Owned(vec![1])),
            AnyTypeInfoKind::Blob,
        );
        assert!(item_from_row("owner", &row).unwrap().is_none());
    }

    #[test]
    fn test_url_scheme_must_match_backend() {
        assert!(check_url_matches(BackendKind::MySql, "mysql://root@localhost/vault").is_ok());
        assert!(check_url_matches(BackendKind::MySql, "mariadb://root@localhost/vault").is_ok());
        assert!(check_url_matches(BackendKind::PostgreSql, "postgres://localhost/vault").is_ok());
        assert!(check_url_matches(BackendKind::PostgreSql, "postgresql://localhost/vault").is_ok());

        let err = check_url_matches(BackendKind::PostgreSql, "mysql://localhost/vault").unwrap_err();
        assert!(matches!(err, StorageError::Config(_)));
        assert!(check_url_matches(BackendKind::Sqlite, "sqlite://vault.db").is_err());
    }

    #[test]
    fn test_connect_rejects_mismatched_url_before_touching_network() {
        let result = ServerDatabase::connect(BackendKind::MySql, "postgres://localhost/vault", 2);
        assert!(matches!(result, Err(StorageError::Config(_))));
    }

    #[test]
    fn test_page_param_bounds() {
        assert_eq!(page_param(0).unwrap(), 0);
        assert!(page_param(u32::MAX).is_err());
    }
}
