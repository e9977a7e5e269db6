//! Live container grid
//!
//! The fillable grid the UI layer renders while a vault session is open.
//! Its contents at close time are what gets persisted.

use crate::error::ModelError;
use crate::owner::OwnerId;
use crate::vault::{clamp_rows, rows_for_size, VaultModel, SLOTS_PER_ROW};
use crate::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct Container<I> {
    title: String,
    slots: Vec<Option<I>>,
}

impl<I> Container<I> {
    pub fn new(size: usize, title: impl Into<String>) -> Self {
        let mut slots = Vec::with_capacity(size);
        slots.resize_with(size, || None);

        Self {
            title: title.into(),
            slots,
        }
    }

    /// Grid of `rows * 9` slots, rows clamped into [1, 6]
    pub fn with_rows(rows: u8, title: impl Into<String>) -> Self {
        Self::new(usize::from(clamp_rows(i64::from(rows))) * SLOTS_PER_ROW, title)
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn get(&self, slot: usize) -> Option<&I> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Put an item into a slot, returning the previous occupant
    pub fn set(&mut self, slot: usize, item: I) -> Result<Option<I>> {
        let size = self.size();
        let cell = self
            .slots
            .get_mut(slot)
            .ok_or(ModelError::SlotOutOfRange { slot, size })?;
        Ok(cell.replace(item))
    }

    /// Empty a slot, returning what was in it
    pub fn take(&mut self, slot: usize) -> Option<I> {
        self.slots.get_mut(slot).and_then(Option::take)
    }

    /// Occupied slots in ascending order
    pub fn occupied(&self) -> impl Iterator<Item = (usize, &I)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, item)| item.as_ref().map(|item| (slot, item)))
    }

    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|item| item.is_some()).count()
    }
}

impl<I: Clone> Container<I> {
    /// Build the grid a loaded vault is rendered into
    pub fn for_vault(model: &VaultModel<I>) -> Self {
        let mut container = Self::with_rows(model.rows, model.display_title());

        for (slot, item) in &model.items {
            if container.set(*slot, item.clone()).is_err() {
                tracing::debug!(
                    owner_id = %model.owner_id,
                    slot = *slot,
                    size = container.size(),
                    "Dropping item outside container"
                );
            }
        }

        container
    }

    /// Snapshot the grid into a model; rows follow the grid capacity
    pub fn capture(&self, owner_id: OwnerId, page: u32) -> VaultModel<I> {
        let mut model = VaultModel::new(owner_id, rows_for_size(self.size()), Some(self.title.clone()));
        model.page = page;
        model.items = self
            .occupied()
            .map(|(slot, item)| (slot, item.clone()))
            .collect();
        model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_rows_sizes_grid() {
        let container: Container<u32> = Container::with_rows(2, "Vault");
        assert_eq!(container.size(), 18);
        assert_eq!(container.occupied_count(), 0);

        let clamped: Container<u32> = Container::with_rows(0, "Vault");
        assert_eq!(clamped.size(), 9);
    }

    #[test]
    fn test_set_take_and_bounds() {
        let mut container = Container::with_rows(1, "Vault");
        assert!(container.set(3, 7u32).unwrap().is_none());
        assert_eq!(container.get(3), Some(&7));
        assert!(container.set(9, 1).is_err());

        assert_eq!(container.take(3), Some(7));
        assert_eq!(container.take(3), None);
        assert_eq!(container.take(40), None);
    }

    #[test]
    fn test_for_vault_drops_out_of_range_items() {
        let owner = OwnerId::random();
        let mut model = VaultModel::with_defaults(owner, 6, "Big");
        model.insert_item(0, "a".to_string()).unwrap();
        model.insert_item(40, "b".to_string()).unwrap();
        model.rows = 1;

        let container = Container::for_vault(&model);
        assert_eq!(container.size(), 9);
        assert_eq!(container.title(), "Big");
        assert_eq!(container.occupied_count(), 1);
        assert_eq!(container.get(0).map(String::as_str), Some("a"));
    }

    #[test]
    fn test_capture_infers_rows_and_title() {
        let owner = OwnerId::random();
        let mut container = Container::new(27, "Chest");
        container.set(0, "a".to_string()).unwrap();
        container.set(26, "z".to_string()).unwrap();

        let model = container.capture(owner, 0);
        assert_eq!(model.owner_id, owner);
        assert_eq!(model.rows, 3);
        assert_eq!(model.title.as_deref(), Some("Chest"));
        assert_eq!(model.items.keys().copied().collect::<Vec<_>>(), vec![0, 26]);
    }

    #[test]
    fn test_capture_clamps_oversized_grid() {
        let container: Container<u8> = Container::new(63, "Huge");
        assert_eq!(container.capture(OwnerId::random(), 0).rows, 6);
    }
}
