use async_trait::async_trait;
use cart_types::domain::item::{ItemPatch, ItemRecord};
use cart_types::ports::cart_store::{CartStore, StoreError};
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

/// In-memory cart storage keyed by website slug. Assigns record ids on add
/// the way the real backend does, which makes it a drop-in stand-in for the
/// remote adapter in tests.
#[derive(Clone)]
pub struct MemoryStore {
    pub slots: Arc<DashMap<String, Vec<ItemRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            slots: Arc::new(DashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn load(&self, website_slug: &str) -> Result<Vec<ItemRecord>, StoreError> {
        Ok(self
            .slots
            .get(website_slug)
            .map(|slot| slot.clone())
            .unwrap_or_default())
    }

    async fn add(&self, mut record: ItemRecord) -> Result<ItemRecord, StoreError> {
        if record.id.is_empty() {
            record.id = Uuid::new_v4().to_string();
        }
        self.slots
            .entry(record.website_slug.clone())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        item_id: &str,
        patch: ItemPatch,
    ) -> Result<Option<ItemRecord>, StoreError> {
        for mut slot in self.slots.iter_mut() {
            if let Some(record) = slot.value_mut().iter_mut().find(|r| r.id == item_id) {
                if let Some(quantity) = patch.quantity {
                    record.quantity = quantity;
                }
                return Ok(Some(record.clone()));
            }
        }
        Ok(None)
    }

    async fn remove(&self, item_id: &str) -> Result<bool, StoreError> {
        for mut slot in self.slots.iter_mut() {
            let before = slot.value().len();
            slot.value_mut().retain(|r| r.id != item_id);
            if slot.value().len() != before {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn clear(&self, website_slug: &str) -> Result<(), StoreError> {
        self.slots.remove(website_slug);
        Ok(())
    }
}
