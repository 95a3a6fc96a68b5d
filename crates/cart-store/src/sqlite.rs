use async_trait::async_trait;
use cart_types::domain::item::{ItemPatch, ItemRecord};
use cart_types::ports::cart_store::{CartStore, StoreError};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;
use uuid::Uuid;

/// Durable local cart storage: one row per scoped key `cart_<slug>` holding
/// the serialized item list, the local analog of the browser's per-site
/// storage entry the guest cart lived in.
pub struct SqliteStore {
    pool: SqlitePool,
}

fn slot_key(website_slug: &str) -> String {
    format!("cart_{website_slug}")
}

#[derive(Serialize, Deserialize, Default)]
struct CartBlob {
    items: Vec<ItemRecord>,
}

#[derive(FromRow)]
struct DbSlot {
    payload: String,
}

impl SqliteStore {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        let pool = SqlitePool::connect_with(options).await?;

        // Run migration from migration file.
        let ddl = include_str!("../migrations/0001_create_cart_slots.sql");
        sqlx::query(ddl).execute(&pool).await?;

        Ok(Self { pool })
    }

    async fn read_items(&self, website_slug: &str) -> Result<Vec<ItemRecord>, StoreError> {
        let row: Option<DbSlot> =
            sqlx::query_as("SELECT payload FROM cart_slots WHERE slot_key = ?")
                .bind(slot_key(website_slug))
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?;
        let Some(row) = row else {
            return Ok(Vec::new());
        };
        // An unreadable blob is an empty cart, never a fatal error.
        match serde_json::from_str::<CartBlob>(&row.payload) {
            Ok(blob) => Ok(blob.items),
            Err(err) => {
                tracing::warn!(website_slug, %err, "corrupt cart blob, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    async fn write_items(
        &self,
        website_slug: &str,
        items: Vec<ItemRecord>,
    ) -> Result<(), StoreError> {
        let payload = serde_json::to_string(&CartBlob { items })
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        sqlx::query(
            "INSERT INTO cart_slots (slot_key, payload) VALUES (?, ?)
             ON CONFLICT(slot_key) DO UPDATE SET payload = excluded.payload",
        )
        .bind(slot_key(website_slug))
        .bind(payload)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn slot_slugs(&self) -> Result<Vec<String>, StoreError> {
        let keys: Vec<(String,)> = sqlx::query_as("SELECT slot_key FROM cart_slots")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(keys
            .into_iter()
            .filter_map(|(key,)| key.strip_prefix("cart_").map(str::to_string))
            .collect())
    }
}

#[async_trait]
impl CartStore for SqliteStore {
    async fn load(&self, website_slug: &str) -> Result<Vec<ItemRecord>, StoreError> {
        self.read_items(website_slug).await
    }

    async fn add(&self, mut record: ItemRecord) -> Result<ItemRecord, StoreError> {
        if record.id.is_empty() {
            record.id = Uuid::new_v4().to_string();
        }
        let slug = record.website_slug.clone();
        let mut items = self.read_items(&slug).await?;
        items.push(record.clone());
        self.write_items(&slug, items).await?;
        Ok(record)
    }

    async fn update(
        &self,
        item_id: &str,
        patch: ItemPatch,
    ) -> Result<Option<ItemRecord>, StoreError> {
        for slug in self.slot_slugs().await? {
            let mut items = self.read_items(&slug).await?;
            if let Some(record) = items.iter_mut().find(|r| r.id == item_id) {
                if let Some(quantity) = patch.quantity {
                    record.quantity = quantity;
                }
                let updated = record.clone();
                self.write_items(&slug, items).await?;
                return Ok(Some(updated));
            }
        }
        Ok(None)
    }

    async fn remove(&self, item_id: &str) -> Result<bool, StoreError> {
        for slug in self.slot_slugs().await? {
            let mut items = self.read_items(&slug).await?;
            let before = items.len();
            items.retain(|r| r.id != item_id);
            if items.len() != before {
                self.write_items(&slug, items).await?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn clear(&self, website_slug: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM cart_slots WHERE slot_key = ?")
            .bind(slot_key(website_slug))
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }
}
