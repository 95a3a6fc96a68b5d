use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The storefront the cart is currently bound to. All items in a cart belong
/// to the bound website; rebinding to a different slug resets the aggregate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Website {
    pub slug: String,
    pub id: Uuid,
    pub name: String,
}

impl Website {
    pub fn new(slug: impl Into<String>, id: Uuid, name: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            id,
            name: name.into(),
        }
    }
}
