use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

fn default_added_at() -> DateTime<Utc> {
    Utc::now()
}

// Storage has shipped string-typed prices and quantities; decode both forms.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrStr {
        Num(f64),
        Str(String),
    }
    match NumOrStr::deserialize(deserializer)? {
        NumOrStr::Num(n) => Ok(n),
        NumOrStr::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrStr {
        Num(u32),
        Str(String),
    }
    match NumOrStr::deserialize(deserializer)? {
        NumOrStr::Num(n) => Ok(n),
        NumOrStr::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// One cart line as adapters move it: the wire/storage shape.
///
/// Older records carry a single `product_image` instead of `images`; the
/// field is kept here so the normalizer can fold it into the canonical list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemRecord {
    #[serde(default)]
    pub id: String,
    pub product_id: String,
    pub name: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub unit_price: f64,
    #[serde(deserialize_with = "lenient_u32")]
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_image: Option<String>,
    pub website_slug: String,
    #[serde(default = "default_added_at")]
    pub added_at: DateTime<Utc>,
}

/// One cart line as the engine holds it, normalized: `images` is the single
/// canonical image source. Identity is `(website_slug, product_id)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItem {
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub unit_price: f64,
    pub quantity: u32,
    pub sku: Option<String>,
    pub images: Vec<String>,
    pub website_slug: String,
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// Locally minted record id; replaced by the server's id after reconcile.
    pub fn mint_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn line_total(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }
}

impl From<CartItem> for ItemRecord {
    fn from(item: CartItem) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            name: item.name,
            unit_price: item.unit_price,
            quantity: item.quantity,
            sku: item.sku,
            images: item.images,
            product_image: None,
            website_slug: item.website_slug,
            added_at: item.added_at,
        }
    }
}

/// Catalog shape handed to `add_to_cart` by product pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub product_image: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

impl ItemPatch {
    pub fn quantity(quantity: u32) -> Self {
        Self {
            quantity: Some(quantity),
        }
    }
}
