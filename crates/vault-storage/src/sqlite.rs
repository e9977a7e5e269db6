//! Embedded SQLite backend

use parking_lot::Mutex;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::dialect::{Dialect, Queries};
use crate::statements::{ItemRecord, MetaRecord, VaultStatements};
use crate::{slot_param, Result};

#[derive(Debug)]
pub struct SqliteDatabase {
    conn: Arc<Mutex<Connection>>,
    queries: Arc<Queries>,
}

impl SqliteDatabase {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;

        // WAL mode for better concurrent performance
        let _: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.busy_timeout(Duration::from_secs(5))?;

        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            queries: Arc::new(Queries::for_dialect(Dialect::Sqlite)),
        }
    }

    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    /// Run primitives in autocommit mode
    pub fn read<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn VaultStatements) -> Result<T>,
    {
        let conn = self.conn.lock();
        let mut statements = SqliteStatements {
            conn: &*conn,
            queries: &self.queries,
        };
        f(&mut statements)
    }

    /// Run primitives in one transaction; an error or panic rolls everything back
    pub fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn VaultStatements) -> Result<T>,
    {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let result = {
            let mut statements = SqliteStatements {
                conn: &*tx,
                queries: &self.queries,
            };
            f(&mut statements)?
        };
        tx.commit()?;
        Ok(result)
    }

    pub(crate) fn execute_ddl(&self, statements: &[String]) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        for sql in statements {
            tx.execute_batch(sql)?;
        }
        tx.commit()?;
        Ok(())
    }
}

impl Clone for SqliteDatabase {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
            queries: Arc::clone(&self.queries),
        }
    }
}

struct SqliteStatements<'c> {
    conn: &'c Connection,
    queries: &'c Queries,
}

impl VaultStatements for SqliteStatements<'_> {
    fn select_meta(&mut self, owner_id: &str) -> Result<Option<MetaRecord>> {
        let meta = self
            .conn
            .query_row(&self.queries.select_meta, [owner_id], |row| {
                Ok(MetaRecord {
                    rows: row.get(0)?,
                    title: row.get(1)?,
                })
            })
            .optional()?;
        Ok(meta)
    }

    fn select_items(&mut self, owner_id: &str, page: u32) -> Result<Vec<ItemRecord>> {
        let mut stmt = self.conn.prepare(&self.queries.select_items)?;
        let rows = stmt.query_map(params![owner_id, page], |row| {
            let slot: i64 = row.get(0)?;
            // Non-blob payloads are handed to the codec as-is and decode to "absent"
            let payload = match row.get_ref(1)? {
                ValueRef::Blob(bytes) | ValueRef::Text(bytes) => bytes.to_vec(),
                _ => Vec::new(),
            };
            Ok((slot, payload))
        })?;

        let mut items = Vec::new();
        for row in rows {
            let (slot, payload) = row?;
            items.extend(ItemRecord::from_columns(owner_id, slot, payload));
        }
        Ok(items)
    }

    fn upsert_meta(&mut self, owner_id: &str, rows: u8, title: Option<&str>) -> Result<()> {
        self.conn
            .execute(&self.queries.upsert_meta, params![owner_id, rows, title])?;
        Ok(())
    }

    fn delete_page_items(&mut self, owner_id: &str, page: u32) -> Result<u64> {
        let deleted = self
            .conn
            .execute(&self.queries.delete_page_items, params![owner_id, page])?;
        Ok(deleted as u64)
    }

    fn delete_owner_items(&mut self, owner_id: &str) -> Result<u64> {
        let deleted = self
            .conn
            .execute(&self.queries.delete_owner_items, [owner_id])?;
        Ok(deleted as u64)
    }

    fn delete_meta(&mut self, owner_id: &str) -> Result<u64> {
        let deleted = self.conn.execute(&self.queries.delete_meta, [owner_id])?;
        Ok(deleted as u64)
    }

    fn insert_item(&mut self, owner_id: &str, page: u32, item: &ItemRecord) -> Result<()> {
        self.conn.execute(
            &self.queries.insert_item,
            params![owner_id, page, slot_param(item.slot)?, item.payload],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StorageError;

    fn database() -> SqliteDatabase {
        let db = SqliteDatabase::open_in_memory().unwrap();
        let dialect = Dialect::Sqlite;
        db.execute_ddl(&[dialect.create_meta_table(), dialect.create_item_table()])
            .unwrap();
        db
    }

    #[test]
    fn test_upsert_meta_keeps_first_rows_and_title() {
        let db = database();
        db.transaction(|s| s.upsert_meta("owner", 2, Some("First")))
            .unwrap();
        db.transaction(|s| s.upsert_meta("owner", 5, Some("Second")))
            .unwrap();

        let meta = db.read(|s| s.select_meta("owner")).unwrap().unwrap();
        assert_eq!(meta.rows, 2);
        assert_eq!(meta.title.as_deref(), Some("First"));

        let updated: Option<String> = db
            .with_connection(|conn| {
                Ok(conn.query_row(
                    "SELECT updated_at FROM vault_meta WHERE owner_id = 'owner'",
                    [],
                    |row| row.get(0),
                )?)
            })
            .unwrap();
        assert!(updated.is_some());
    }

    #[test]
    fn test_failed_transaction_rolls_back() {
        let db = database();
        let result: Result<()> = db.transaction(|s| {
            s.upsert_meta("owner", 3, None)?;
            s.insert_item(
                "owner",
                0,
                &ItemRecord {
                    slot: 4,
                    payload: vec![1, 2, 3],
                },
            )?;
            Err(StorageError::InvalidData("forced".to_string()))
        });
        assert!(result.is_err());

        assert!(db.read(|s| s.select_meta("owner")).unwrap().is_none());
        assert!(db.read(|s| s.select_items("owner", 0)).unwrap().is_empty());
    }

    #[test]
    fn test_items_are_scoped_by_page() {
        let db = database();
        db.transaction(|s| {
            for (page, slot) in [(0, 1), (0, 2), (1, 1)] {
                s.insert_item(
                    "owner",
                    page,
                    &ItemRecord {
                        slot,
                        payload: vec![slot as u8],
                    },
                )?;
            }
            Ok(())
        })
        .unwrap();

        assert_eq!(db.read(|s| s.select_items("owner", 0)).unwrap().len(), 2);
        assert_eq!(db.transaction(|s| s.delete_page_items("owner", 0)).unwrap(), 2);
        assert_eq!(db.read(|s| s.select_items("owner", 1)).unwrap().len(), 1);
        assert_eq!(db.transaction(|s| s.delete_owner_items("owner")).unwrap(), 1);
    }

    #[test]
    fn test_negative_slots_and_text_payloads_are_tolerated() {
        let db = database();
        db.with_connection(|conn| {
            conn.execute_batch(
                "INSERT INTO vault_item (owner_id, page, slot, payload) VALUES ('owner', 0, -1, x'01');
                 INSERT INTO vault_item (owner_id, page, slot, payload) VALUES ('owner', 0, 3, 'text');",
            )?;
            Ok(())
        })
        .unwrap();

        let items = db.read(|s| s.select_items("owner", 0)).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].slot, 3);
        assert_eq!(items[0].payload, b"text".to_vec());
    }
}
