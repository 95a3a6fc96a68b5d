//! Canonicalizes item image data: folds the legacy single-image field into
//! `images` on the way in, and sanitizes image URLs on the way out to the
//! remote backend.

use cart_types::domain::item::{CartItem, ItemRecord, Product};
use chrono::Utc;

/// Longest image URL the backend's cart field can hold.
pub const MAX_IMAGE_URL_LEN: usize = 500;

const DATA_URL_PREFIX: &str = "data:";

/// Record -> engine shape. A record carrying only the legacy `product_image`
/// field gets `images = [product_image]`. Images are never invented from
/// nothing.
pub fn normalize_record(record: ItemRecord) -> CartItem {
    let ItemRecord {
        id,
        product_id,
        name,
        unit_price,
        quantity,
        sku,
        mut images,
        product_image,
        website_slug,
        added_at,
    } = record;

    if images.is_empty() {
        if let Some(legacy) = product_image {
            images.push(legacy);
        }
    }

    CartItem {
        id,
        product_id,
        name,
        unit_price,
        quantity,
        sku,
        images,
        website_slug,
        added_at,
    }
}

pub fn normalize_records(records: Vec<ItemRecord>) -> Vec<CartItem> {
    records.into_iter().map(normalize_record).collect()
}

/// A fresh cart line for a product being added, with a locally minted id and
/// the legacy image field already folded in.
pub fn item_from_product(product: Product, quantity: u32, website_slug: &str) -> CartItem {
    normalize_record(ItemRecord {
        id: CartItem::mint_id(),
        product_id: product.id,
        name: product.name,
        unit_price: product.price,
        quantity,
        sku: product.sku,
        images: product.images,
        product_image: product.product_image,
        website_slug: website_slug.into(),
        added_at: Utc::now(),
    })
}

/// Embedded-data images cannot fit the backend's cart field and are dropped
/// to empty; anything else is clipped to the field length. Relative and
/// absolute network URLs pass through unchanged.
pub fn sanitize_image_url(url: &str) -> String {
    if url.starts_with(DATA_URL_PREFIX) {
        return String::new();
    }
    match url.char_indices().nth(MAX_IMAGE_URL_LEN) {
        Some((idx, _)) => url[..idx].to_string(),
        None => url.to_string(),
    }
}

pub fn sanitize_images(images: &[String]) -> Vec<String> {
    images.iter().map(|url| sanitize_image_url(url)).collect()
}

/// Outbound copy of a line for the remote adapter, image URLs sanitized.
pub fn outbound_record(item: &CartItem) -> ItemRecord {
    let mut record = ItemRecord::from(item.clone());
    record.images = sanitize_images(&item.images);
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_images(images: Vec<String>, product_image: Option<String>) -> ItemRecord {
        ItemRecord {
            id: "1".into(),
            product_id: "p1".into(),
            name: "Widget".into(),
            unit_price: 10.0,
            quantity: 1,
            sku: None,
            images,
            product_image,
            website_slug: "acme".into(),
            added_at: Utc::now(),
        }
    }

    #[test]
    fn legacy_single_image_fills_empty_list() {
        let item = normalize_record(record_with_images(
            vec![],
            Some("http://x/img.png".into()),
        ));
        assert_eq!(item.images, vec!["http://x/img.png".to_string()]);
    }

    #[test]
    fn image_list_wins_over_legacy_field() {
        let item = normalize_record(record_with_images(
            vec!["http://x/a.png".into()],
            Some("http://x/legacy.png".into()),
        ));
        assert_eq!(item.images, vec!["http://x/a.png".to_string()]);
    }

    #[test]
    fn no_image_info_stays_empty() {
        let item = normalize_record(record_with_images(vec![], None));
        assert!(item.images.is_empty());
    }

    #[test]
    fn data_urls_are_dropped_to_empty() {
        let sanitized = sanitize_image_url("data:image/png;base64,iVBORw0KGgo=");
        assert_eq!(sanitized, "");
    }

    #[test]
    fn long_urls_are_clipped_to_field_length() {
        let long = format!("https://cdn.example.com/{}", "a".repeat(600));
        let sanitized = sanitize_image_url(&long);
        assert_eq!(sanitized.chars().count(), MAX_IMAGE_URL_LEN);
        assert!(long.starts_with(&sanitized));
    }

    #[test]
    fn clipping_respects_char_boundaries() {
        let long = "ü".repeat(600);
        let sanitized = sanitize_image_url(&long);
        assert_eq!(sanitized.chars().count(), MAX_IMAGE_URL_LEN);
    }

    #[test]
    fn network_urls_pass_through() {
        for url in ["https://cdn.example.com/w.png", "/media/products/w.png"] {
            assert_eq!(sanitize_image_url(url), url);
        }
    }

    #[test]
    fn outbound_record_sanitizes_without_touching_the_item() {
        let item = normalize_record(record_with_images(
            vec!["data:image/png;base64,AAAA".into(), "http://x/a.png".into()],
            None,
        ));
        let record = outbound_record(&item);
        assert_eq!(record.images, vec!["".to_string(), "http://x/a.png".to_string()]);
        // The in-memory line keeps what the product page gave it.
        assert_eq!(item.images[0], "data:image/png;base64,AAAA");
    }
}
