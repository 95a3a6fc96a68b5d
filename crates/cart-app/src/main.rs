use std::sync::Arc;

use cart_client::{BearerSession, StorefrontClient};
use cart_engine::application::cart_service::CartService;
use cart_engine::config::Config;
use cart_store::{build_store, Store};
use cart_types::domain::item::Product;
use cart_types::domain::website::Website;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for API_BASE_URL / CART_DB_URL when present.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string()))
        .init();

    let config = Config::from_env()?;
    let session = Arc::new(BearerSession::new());
    let client = StorefrontClient::builder(&config.api_base_url)?
        .with_auth(session.clone())
        .build()?;
    let local: Store = build_store(config.cart_db_url.as_deref()).await?;

    // No token in the session, so every operation below takes the guest
    // path through the local store.
    let cart = CartService::new(client.clone(), local, client, session);

    cart.set_website_info(Website::new("demo-store", Uuid::new_v4(), "Demo Store"));
    cart.refresh().await?;

    cart.add_to_cart(
        Product {
            id: "p-100".into(),
            name: "Enamel Mug".into(),
            price: 14.0,
            sku: Some("MUG-100".into()),
            images: vec!["https://cdn.example.com/mug.png".into()],
            product_image: None,
        },
        2,
    )
    .await?;
    cart.update_quantity("p-100", 3).await?;

    let snapshot = cart.snapshot();
    tracing::info!(
        items = snapshot.items.len(),
        total = snapshot.total,
        "cart after demo mutations"
    );
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    cart.clear_cart().await?;
    Ok(())
}
