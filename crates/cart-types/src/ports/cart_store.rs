use async_trait::async_trait;

use crate::domain::item::{ItemPatch, ItemRecord};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("store error: {0}")]
    Backend(String),
}

/// One contract over both cart backends (remote API, local keyed store).
/// Adapters move opaque records; identity-merge and totals stay in the
/// engine.
#[async_trait]
pub trait CartStore: Send + Sync + 'static {
    async fn load(&self, website_slug: &str) -> Result<Vec<ItemRecord>, StoreError>;
    async fn add(&self, record: ItemRecord) -> Result<ItemRecord, StoreError>;
    async fn update(
        &self,
        item_id: &str,
        patch: ItemPatch,
    ) -> Result<Option<ItemRecord>, StoreError>;
    async fn remove(&self, item_id: &str) -> Result<bool, StoreError>;
    async fn clear(&self, website_slug: &str) -> Result<(), StoreError>;
}
