///  To run :
///  cargo r --example guest_cart
use std::sync::Arc;

use cart_client::{BearerSession, StorefrontClient};
use cart_engine::application::cart_service::CartService;
use cart_engine::errors::CartError;
use cart_store::build_store;
use cart_types::domain::item::Product;
use cart_types::domain::order::CustomerInfo;
use cart_types::domain::website::Website;
use tempfile::tempdir;
use uuid::Uuid;

fn product(id: &str, name: &str, price: f64) -> Product {
    Product {
        id: id.into(),
        name: name.into(),
        price,
        sku: None,
        images: vec![],
        product_image: Some(format!("https://cdn.example.com/{id}.png")),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Use a temp file-backed SQLite DB so the cart survives a rebind.
    let tmp = tempdir()?;
    let db_path = tmp.path().join("cart.db");
    let db_url = format!("sqlite://{}", db_path.display());

    let session = Arc::new(BearerSession::new());
    let client = StorefrontClient::builder("http://localhost:8000/api")?
        .with_auth(session.clone())
        .build()?;
    let local = build_store(Some(&db_url)).await?;

    // The session holds no token, so everything runs through the local
    // store; the remote client never sees a request.
    let cart = CartService::new(client.clone(), local, client, session);

    let shop = Website::new("corner-shop", Uuid::new_v4(), "Corner Shop");
    cart.set_website_info(shop.clone());
    cart.refresh().await?;

    cart.add_to_cart(product("p-1", "Notebook", 6.5), 1).await?;
    cart.add_to_cart(product("p-1", "Notebook", 6.5), 1).await?;
    cart.add_to_cart(product("p-2", "Pen", 2.0), 3).await?;

    let snapshot = cart.snapshot();
    println!(
        "after adds: {} lines, total {:.2}",
        snapshot.items.len(),
        snapshot.total
    );
    assert_eq!(snapshot.items.len(), 2);
    assert_eq!(snapshot.items[0].quantity, 2);

    // The legacy product_image field was folded into images on the way in.
    assert_eq!(
        snapshot.items[0].images,
        vec!["https://cdn.example.com/p-1.png".to_string()]
    );

    // Checkout refuses incomplete customer info before touching the network.
    let incomplete = CustomerInfo {
        name: "Ada".into(),
        ..CustomerInfo::default()
    };
    match cart.checkout(incomplete).await {
        Err(CartError::MissingField(field)) => println!("checkout refused: missing {field}"),
        other => anyhow::bail!("unexpected checkout outcome: {other:?}"),
    }

    // Rebinding another website resets the aggregate...
    cart.set_website_info(Website::new("other-shop", Uuid::new_v4(), "Other Shop"));
    assert!(cart.snapshot().items.is_empty());

    // ...and coming back reloads the persisted cart.
    cart.set_website_info(shop);
    cart.refresh().await?;
    println!(
        "reloaded {} lines from the local store",
        cart.snapshot().items.len()
    );
    assert_eq!(cart.snapshot().items.len(), 2);

    cart.clear_cart().await?;
    println!("cart cleared");
    Ok(())
}
