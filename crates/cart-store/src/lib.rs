#[cfg(not(any(feature = "memory", feature = "sqlite")))]
compile_error!("Enable a store feature: `memory` or `sqlite`.");

use async_trait::async_trait;
use cart_types::domain::item::{ItemPatch, ItemRecord};
use cart_types::ports::cart_store::{CartStore, StoreError};

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

// When both features are compiled in, the durable backend carries the cart.
pub struct Store {
    #[cfg(all(feature = "memory", not(feature = "sqlite")))]
    memory: memory::MemoryStore,
    #[cfg(feature = "sqlite")]
    sqlite: sqlite::SqliteStore,
}

pub async fn build_store(url: Option<&str>) -> anyhow::Result<Store> {
    Store::build_store(url).await
}

impl Store {
    #[cfg(all(feature = "memory", not(feature = "sqlite")))]
    pub async fn build_store(_: Option<&str>) -> anyhow::Result<Self> {
        Ok(Self {
            memory: memory::MemoryStore::new(),
        })
    }

    #[cfg(feature = "sqlite")]
    pub async fn build_store(database_url: Option<&str>) -> anyhow::Result<Self> {
        let url = database_url.unwrap_or("sqlite://storefront-cart.db");
        let sqlite = sqlite::SqliteStore::new(url).await?;
        Ok(Self { sqlite })
    }
}

#[cfg(all(feature = "memory", not(feature = "sqlite")))]
#[async_trait]
impl CartStore for Store {
    async fn load(&self, website_slug: &str) -> Result<Vec<ItemRecord>, StoreError> {
        self.memory.load(website_slug).await
    }

    async fn add(&self, record: ItemRecord) -> Result<ItemRecord, StoreError> {
        self.memory.add(record).await
    }

    async fn update(
        &self,
        item_id: &str,
        patch: ItemPatch,
    ) -> Result<Option<ItemRecord>, StoreError> {
        self.memory.update(item_id, patch).await
    }

    async fn remove(&self, item_id: &str) -> Result<bool, StoreError> {
        self.memory.remove(item_id).await
    }

    async fn clear(&self, website_slug: &str) -> Result<(), StoreError> {
        self.memory.clear(website_slug).await
    }
}

#[cfg(feature = "sqlite")]
#[async_trait]
impl CartStore for Store {
    async fn load(&self, website_slug: &str) -> Result<Vec<ItemRecord>, StoreError> {
        self.sqlite.load(website_slug).await
    }

    async fn add(&self, record: ItemRecord) -> Result<ItemRecord, StoreError> {
        self.sqlite.add(record).await
    }

    async fn update(
        &self,
        item_id: &str,
        patch: ItemPatch,
    ) -> Result<Option<ItemRecord>, StoreError> {
        self.sqlite.update(item_id, patch).await
    }

    async fn remove(&self, item_id: &str) -> Result<bool, StoreError> {
        self.sqlite.remove(item_id).await
    }

    async fn clear(&self, website_slug: &str) -> Result<(), StoreError> {
        self.sqlite.clear(website_slug).await
    }
}
