//! Checkout orchestration helpers: precondition checks and order draft
//! assembly. Submission and cart clearing are driven by `CartService`.

use cart_types::domain::item::CartItem;
use cart_types::domain::order::{CustomerInfo, OrderDraft, OrderLine};
use cart_types::domain::website::Website;

use crate::application::cart_service::Cart;
use crate::errors::CartError;

/// Preconditions in order: website bound, cart non-empty, customer fields
/// complete. The first failure wins and names its field.
pub(crate) fn validate<'a>(cart: &'a Cart, customer: &CustomerInfo) -> Result<&'a Website, CartError> {
    let website = cart.website.as_ref().ok_or(CartError::NoWebsite)?;
    if cart.items.is_empty() {
        return Err(CartError::EmptyCart);
    }
    if let Some(field) = customer.first_missing_field() {
        return Err(CartError::MissingField(field));
    }
    Ok(website)
}

/// Snapshot the cart into the order payload. Prices and quantities are
/// numeric by the time items reach the engine; string-typed values from
/// storage were coerced at decode time.
pub(crate) fn build_draft(
    website: &Website,
    items: &[CartItem],
    total: f64,
    customer: CustomerInfo,
) -> OrderDraft {
    OrderDraft {
        customer,
        website_slug: website.slug.clone(),
        website_name: website.name.clone(),
        items: items
            .iter()
            .map(|item| OrderLine {
                product_id: item.product_id.clone(),
                name: item.name.clone(),
                price: item.unit_price,
                quantity: item.quantity,
            })
            .collect(),
        total,
    }
}
