//! Storage primitives shared by every backend
//!
//! Each backend implements `VaultStatements` over one connection or one open
//! transaction. Higher layers compose these into load/save/clear without
//! knowing which dialect runs underneath.

use crate::Result;

/// Meta row as stored; `rows` is not yet clamped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaRecord {
    pub rows: i64,
    pub title: Option<String>,
}

/// One stored slot with its opaque payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecord {
    pub slot: usize,
    pub payload: Vec<u8>,
}

impl ItemRecord {
    /// Build a record from raw column values, skipping slots that cannot be addressed
    pub(crate) fn from_columns(owner_id: &str, slot: i64, payload: Vec<u8>) -> Option<Self> {
        match usize::try_from(slot) {
            Ok(slot) => Some(Self { slot, payload }),
            Err(_) => {
                tracing::warn!(owner_id = %owner_id, slot, "Skipping item with negative slot");
                None
            }
        }
    }
}

pub trait VaultStatements {
    fn select_meta(&mut self, owner_id: &str) -> Result<Option<MetaRecord>>;

    fn select_items(&mut self, owner_id: &str, page: u32) -> Result<Vec<ItemRecord>>;

    /// Insert the meta row, or only bump `updated_at` when it already exists
    fn upsert_meta(&mut self, owner_id: &str, rows: u8, title: Option<&str>) -> Result<()>;

    fn delete_page_items(&mut self, owner_id: &str, page: u32) -> Result<u64>;

    /// Remove items across all pages
    fn delete_owner_items(&mut self, owner_id: &str) -> Result<u64>;

    fn delete_meta(&mut self, owner_id: &str) -> Result<u64>;

    fn insert_item(&mut self, owner_id: &str, page: u32, item: &ItemRecord) -> Result<()>;
}
