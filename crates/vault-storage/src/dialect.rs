//! SQL dialects
//!
//! The save/clear algorithm is shared by every backend. What differs is a
//! narrow set of primitives: placeholder syntax, identifier quoting, the
//! binary column type and the upsert clause. `Queries` renders the full
//! statement set once per dialect.

use serde::{Deserialize, Serialize};

pub const META_TABLE: &str = "vault_meta";
pub const ITEM_TABLE: &str = "vault_item";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Sqlite,
    MySql,
    PostgreSql,
}

impl Dialect {
    /// Bind marker for the 1-based parameter `index`
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::Sqlite => format!("?{}", index),
            Dialect::MySql => "?".to_string(),
            Dialect::PostgreSql => format!("${}", index),
        }
    }

    pub fn quote_ident(&self, ident: &str) -> String {
        match self {
            Dialect::MySql => format!("`{}`", ident.replace('`', "``")),
            Dialect::Sqlite | Dialect::PostgreSql => format!("\"{}\"", ident.replace('"', "\"\"")),
        }
    }

    /// Column type for opaque item payloads
    pub fn binary_type(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "BLOB",
            Dialect::MySql => "LONGBLOB",
            Dialect::PostgreSql => "BYTEA",
        }
    }

    fn owner_type(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "TEXT",
            Dialect::MySql | Dialect::PostgreSql => "VARCHAR(36)",
        }
    }

    /// MySQL hands `TEXT` back as a blob; a bounded VARCHAR stays text
    fn title_type(&self) -> &'static str {
        match self {
            Dialect::MySql => "VARCHAR(255)",
            Dialect::Sqlite | Dialect::PostgreSql => "TEXT",
        }
    }

    fn timestamp_type(&self) -> &'static str {
        match self {
            Dialect::MySql => "TIMESTAMP NULL",
            Dialect::Sqlite | Dialect::PostgreSql => "TIMESTAMP",
        }
    }

    /// Conflict branch of the meta upsert: rows/title stay as first written
    fn touch_on_conflict(&self) -> &'static str {
        match self {
            Dialect::MySql => "ON DUPLICATE KEY UPDATE updated_at = CURRENT_TIMESTAMP",
            Dialect::Sqlite | Dialect::PostgreSql => {
                "ON CONFLICT (owner_id) DO UPDATE SET updated_at = CURRENT_TIMESTAMP"
            }
        }
    }

    pub fn create_meta_table(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {META_TABLE} (
                owner_id {owner} NOT NULL PRIMARY KEY,
                {rows} INT NOT NULL,
                title {title},
                updated_at {ts}
            )",
            owner = self.owner_type(),
            rows = self.quote_ident("rows"),
            title = self.title_type(),
            ts = self.timestamp_type(),
        )
    }

    pub fn create_item_table(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {ITEM_TABLE} (
                owner_id {owner} NOT NULL,
                page INT NOT NULL DEFAULT 0,
                slot INT NOT NULL,
                payload {bin} NOT NULL,
                PRIMARY KEY (owner_id, page, slot)
            )",
            owner = self.owner_type(),
            bin = self.binary_type(),
        )
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Dialect::Sqlite => "sqlite",
            Dialect::MySql => "mysql",
            Dialect::PostgreSql => "postgresql",
        };
        write!(f, "{}", name)
    }
}

/// Every statement the repository issues, rendered for one dialect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Queries {
    pub select_meta: String,
    pub select_items: String,
    pub upsert_meta: String,
    pub delete_page_items: String,
    pub delete_owner_items: String,
    pub delete_meta: String,
    pub insert_item: String,
}

impl Queries {
    pub fn for_dialect(dialect: Dialect) -> Self {
        let p = |index| dialect.placeholder(index);
        let rows = dialect.quote_ident("rows");

        Self {
            select_meta: format!(
                "SELECT {rows}, title FROM {META_TABLE} WHERE owner_id = {}",
                p(1)
            ),
            select_items: format!(
                "SELECT slot, payload FROM {ITEM_TABLE} WHERE owner_id = {} AND page = {} ORDER BY slot",
                p(1),
                p(2)
            ),
            upsert_meta: format!(
                "INSERT INTO {META_TABLE} (owner_id, {rows}, title, updated_at) VALUES ({}, {}, {}, CURRENT_TIMESTAMP) {}",
                p(1),
                p(2),
                p(3),
                dialect.touch_on_conflict()
            ),
            delete_page_items: format!(
                "DELETE FROM {ITEM_TABLE} WHERE owner_id = {} AND page = {}",
                p(1),
                p(2)
            ),
            delete_owner_items: format!("DELETE FROM {ITEM_TABLE} WHERE owner_id = {}", p(1)),
            delete_meta: format!("DELETE FROM {META_TABLE} WHERE owner_id = {}", p(1)),
            insert_item: format!(
                "INSERT INTO {ITEM_TABLE} (owner_id, page, slot, payload) VALUES ({}, {}, {}, {})",
                p(1),
                p(2),
                p(3),
                p(4)
            ),
        }
    }
}
