//! Vault Repository
//!
//! Load, save and clear on top of whichever backend is configured.
//! Storage errors stop here: `load` degrades to defaults, `save` and `clear`
//! report `false`. The `try_*` variants keep the cause for callers that want it.

use vault_model::{clamp_rows, Container, ItemCodec, OwnerId, VaultModel};
use vault_storage::{Database, ItemRecord, SchemaError};

use crate::Result;

/// Page every current vault lives on
pub const DEFAULT_PAGE: u32 = 0;

pub struct VaultRepository<C> {
    db: Database,
    codec: C,
}

impl<C: ItemCodec> VaultRepository<C> {
    pub fn new(db: Database, codec: C) -> Self {
        Self { db, codec }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn ensure_schema(&self) -> std::result::Result<(), SchemaError> {
        self.db.ensure_schema()
    }

    /// Load a vault, never failing. Storage errors yield an empty vault built from the defaults.
    pub fn load(
        &self,
        owner_id: OwnerId,
        default_rows: u8,
        default_title: &str,
    ) -> VaultModel<C::Item> {
        match self.try_load(owner_id, default_rows, default_title) {
            Ok(model) => model,
            Err(e) => {
                tracing::warn!(
                    owner_id = %owner_id,
                    error = %e,
                    "Failed to load vault, using defaults"
                );
                VaultModel::with_defaults(owner_id, default_rows, default_title)
            }
        }
    }

    pub fn try_load(
        &self,
        owner_id: OwnerId,
        default_rows: u8,
        default_title: &str,
    ) -> Result<VaultModel<C::Item>> {
        let owner = owner_id.to_string();
        let (meta, records) = self.db.read(|s| {
            let meta = s.select_meta(&owner)?;
            let records = s.select_items(&owner, DEFAULT_PAGE)?;
            Ok((meta, records))
        })?;

        let mut model = match meta {
            Some(meta) => VaultModel::new(
                owner_id,
                clamp_rows(meta.rows),
                Some(meta.title.unwrap_or_else(|| default_title.to_string())),
            ),
            None => VaultModel::with_defaults(owner_id, default_rows, default_title),
        };
        model.page = DEFAULT_PAGE;

        for record in records {
            let Some(item) = self.codec.decode_or_absent(&record.payload) else {
                tracing::debug!(owner_id = %owner_id, slot = record.slot, "Dropping undecodable slot");
                continue;
            };
            if let Err(e) = model.insert_item(record.slot, item) {
                tracing::debug!(owner_id = %owner_id, error = %e, "Dropping stored item outside vault");
            }
        }

        Ok(model)
    }

    /// Persist the live container for `model`'s owner and page. Returns `false` on failure.
    pub fn save(&self, model: &VaultModel<C::Item>, container: &Container<C::Item>) -> bool {
        match self.try_save(model, container) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(
                    owner_id = %model.owner_id,
                    page = model.page,
                    error = %e,
                    "Failed to save vault"
                );
                false
            }
        }
    }

    /// Save in one transaction: upsert meta, then replace the page's items.
    /// Returns the number of slots stored.
    pub fn try_save(
        &self,
        model: &VaultModel<C::Item>,
        container: &Container<C::Item>,
    ) -> Result<usize> {
        if container.size() != model.capacity() {
            tracing::warn!(
                owner_id = %model.owner_id,
                container_size = container.size(),
                expected = model.capacity(),
                "Container size does not match vault rows"
            );
        }

        let owner = model.owner_id.to_string();
        let records = self.encode_slots(&model.owner_id, container);
        let page = model.page;

        self.db.transaction(|s| {
            s.upsert_meta(&owner, model.rows, model.title.as_deref())?;
            s.delete_page_items(&owner, page)?;
            for record in &records {
                s.insert_item(&owner, page, record)?;
            }
            Ok(())
        })?;

        tracing::info!(
            owner_id = %model.owner_id,
            page,
            slots = records.len(),
            "Saved vault"
        );
        Ok(records.len())
    }

    /// Remove every page and the meta row for an owner. Returns `false` on failure.
    pub fn clear(&self, owner_id: OwnerId) -> bool {
        match self.try_clear(owner_id) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(owner_id = %owner_id, error = %e, "Failed to clear vault");
                false
            }
        }
    }

    /// Returns the number of item rows removed
    pub fn try_clear(&self, owner_id: OwnerId) -> Result<u64> {
        let owner = owner_id.to_string();
        let removed = self.db.transaction(|s| {
            let items = s.delete_owner_items(&owner)?;
            s.delete_meta(&owner)?;
            Ok(items)
        })?;

        tracing::info!(owner_id = %owner_id, items = removed, "Cleared vault");
        Ok(removed)
    }

    /// Encode occupied slots; empty items and failed encodings are skipped, not stored
    fn encode_slots(&self, owner_id: &OwnerId, container: &Container<C::Item>) -> Vec<ItemRecord> {
        let mut records = Vec::with_capacity(container.occupied_count());

        for (slot, item) in container.occupied() {
            if self.codec.is_empty(item) {
                continue;
            }
            match self.codec.encode(item) {
                Ok(payload) if payload.is_empty() => {}
                Ok(payload) => records.push(ItemRecord { slot, payload }),
                Err(e) => {
                    tracing::warn!(owner_id = %owner_id, slot, error = %e, "Skipping unencodable item");
                }
            }
        }

        records
    }
}
