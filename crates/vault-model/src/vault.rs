//! Vault data structure

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ModelError;
use crate::owner::OwnerId;
use crate::Result;

pub const SLOTS_PER_ROW: usize = 9;
pub const MIN_ROWS: u8 = 1;
pub const MAX_ROWS: u8 = 6;
pub const DEFAULT_TITLE: &str = "Vault";

/// Clamp any row count (configuration, command input, stored value) into [1, 6].
pub fn clamp_rows(rows: i64) -> u8 {
    rows.clamp(i64::from(MIN_ROWS), i64::from(MAX_ROWS)) as u8
}

/// Rows implied by a container capacity, clamped into [1, 6].
pub fn rows_for_size(size: usize) -> u8 {
    clamp_rows(i64::try_from(size / SLOTS_PER_ROW).unwrap_or(i64::MAX))
}

/// One page of a player's vault
///
/// `items` maps slot index to a decoded item; an absent slot is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultModel<I> {
    /// Owning player
    pub owner_id: OwnerId,
    /// Grid height, always within [1, 6]
    pub rows: u8,
    /// Display title; `None` renders as the default title
    pub title: Option<String>,
    /// Reserved for multi-page vaults, currently always 0
    pub page: u32,
    pub items: BTreeMap<usize, I>,
}

impl<I> VaultModel<I> {
    pub fn new(owner_id: OwnerId, rows: u8, title: Option<String>) -> Self {
        Self {
            owner_id,
            rows: clamp_rows(i64::from(rows)),
            title,
            page: 0,
            items: BTreeMap::new(),
        }
    }

    /// Empty vault synthesized from caller defaults
    pub fn with_defaults(owner_id: OwnerId, default_rows: u8, default_title: &str) -> Self {
        Self::new(owner_id, default_rows, Some(default_title.to_string()))
    }

    /// Number of slots (`rows * 9`)
    pub fn capacity(&self) -> usize {
        usize::from(self.rows) * SLOTS_PER_ROW
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(DEFAULT_TITLE)
    }

    pub fn item(&self, slot: usize) -> Option<&I> {
        self.items.get(&slot)
    }

    /// Place an item, returning whatever occupied the slot before
    pub fn insert_item(&mut self, slot: usize, item: I) -> Result<Option<I>> {
        let size = self.capacity();
        if slot >= size {
            return Err(ModelError::SlotOutOfRange { slot, size });
        }
        Ok(self.items.insert(slot, item))
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_clamped() {
        assert_eq!(clamp_rows(0), 1);
        assert_eq!(clamp_rows(-4), 1);
        assert_eq!(clamp_rows(3), 3);
        assert_eq!(clamp_rows(60), 6);

        let model: VaultModel<String> = VaultModel::new(OwnerId::random(), 9, None);
        assert_eq!(model.rows, 6);
        assert_eq!(model.capacity(), 54);
    }

    #[test]
    fn test_rows_for_size() {
        assert_eq!(rows_for_size(0), 1);
        assert_eq!(rows_for_size(18), 2);
        assert_eq!(rows_for_size(20), 2);
        assert_eq!(rows_for_size(54), 6);
        assert_eq!(rows_for_size(90), 6);
    }

    #[test]
    fn test_insert_item_respects_capacity() {
        let mut model = VaultModel::with_defaults(OwnerId::random(), 2, "Vault");
        assert!(model.insert_item(17, "gem".to_string()).unwrap().is_none());
        assert_eq!(
            model.insert_item(17, "gold".to_string()).unwrap().as_deref(),
            Some("gem")
        );

        let err = model.insert_item(18, "dirt".to_string()).unwrap_err();
        assert!(matches!(err, ModelError::SlotOutOfRange { slot: 18, size: 18 }));
        assert_eq!(model.item_count(), 1);
    }

    #[test]
    fn test_display_title_falls_back() {
        let model: VaultModel<String> = VaultModel::new(OwnerId::random(), 1, None);
        assert_eq!(model.display_title(), DEFAULT_TITLE);
        assert_eq!(model.page, 0);
    }
}
