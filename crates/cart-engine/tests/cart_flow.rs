use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cart_engine::application::cart_service::CartService;
use cart_engine::errors::CartError;
use cart_store::memory::MemoryStore;
use cart_types::domain::item::Product;
use cart_types::domain::order::{CustomerInfo, OrderDraft, OrderReceipt, OrderStatus};
use cart_types::domain::website::Website;
use cart_types::ports::auth_gate::AuthGate;
use cart_types::ports::cart_store::CartStore;
use cart_types::ports::order_gateway::{GatewayError, OrderGateway};
use uuid::Uuid;

struct Guest;
impl AuthGate for Guest {
    fn current_token(&self) -> Option<String> {
        None
    }
}

struct Authed;
impl AuthGate for Authed {
    fn current_token(&self) -> Option<String> {
        Some("integration-token".into())
    }
}

#[derive(Clone, Default)]
struct CapturingGateway {
    drafts: Arc<Mutex<Vec<OrderDraft>>>,
}

#[async_trait]
impl OrderGateway for CapturingGateway {
    async fn create_order(&self, draft: OrderDraft) -> Result<OrderReceipt, GatewayError> {
        self.drafts.lock().unwrap().push(draft);
        Ok(OrderReceipt {
            id: "ord-77".into(),
            status: OrderStatus::Pending,
        })
    }
}

fn website() -> Website {
    Website::new("acme", Uuid::new_v4(), "Acme Goods")
}

fn product(id: &str, name: &str, price: f64) -> Product {
    Product {
        id: id.into(),
        name: name.into(),
        price,
        sku: None,
        images: vec![format!("https://cdn.example.com/{id}.png")],
        product_image: None,
    }
}

fn customer() -> CustomerInfo {
    CustomerInfo {
        name: "Eve".into(),
        email: "eve@example.com".into(),
        phone: "555-0101".into(),
        address: "2 Side St".into(),
        city: "Shelbyville".into(),
        zip_code: "54321".into(),
    }
}

// End-to-end guest flow against the in-memory adapter.
#[tokio::test]
async fn guest_add_update_remove_clear_flow() {
    let local = MemoryStore::new();
    let svc = CartService::new(
        MemoryStore::new(),
        local.clone(),
        CapturingGateway::default(),
        Arc::new(Guest),
    );
    let mut updates = svc.subscribe();

    svc.set_website_info(website());
    svc.add_to_cart(product("p1", "Widget", 10.0), 1).await.unwrap();
    svc.add_to_cart(product("p2", "Gadget", 7.5), 2).await.unwrap();

    let cart = svc.snapshot();
    assert_eq!(cart.items.len(), 2);
    assert_eq!(cart.total, 25.0);

    svc.update_quantity("p2", 4).await.unwrap();
    assert_eq!(svc.snapshot().total, 40.0);

    svc.remove_from_cart("p1").await.unwrap();
    let cart = svc.snapshot();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].product_id, "p2");

    svc.clear_cart().await.unwrap();
    assert!(svc.snapshot().items.is_empty());
    assert!(local.load("acme").await.unwrap().is_empty());

    // The watch channel saw the published states; the latest one is final.
    assert!(updates.has_changed().unwrap());
    assert!(updates.borrow_and_update().items.is_empty());
}

#[tokio::test]
async fn authenticated_flow_checks_out_through_the_gateway() {
    let remote = MemoryStore::new();
    let gateway = CapturingGateway::default();
    let svc = CartService::new(
        remote.clone(),
        MemoryStore::new(),
        gateway.clone(),
        Arc::new(Authed),
    );

    svc.set_website_info(website());
    svc.add_to_cart(product("p1", "Widget", 25.0), 1).await.unwrap();

    // The remote adapter carried the write and the reconcile load.
    assert_eq!(remote.load("acme").await.unwrap().len(), 1);

    let receipt = svc.checkout(customer()).await.unwrap();
    assert_eq!(receipt.id, "ord-77");

    let drafts = gateway.drafts.lock().unwrap();
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].total, 25.0);
    assert_eq!(drafts[0].website_name, "Acme Goods");
    drop(drafts);

    assert!(svc.snapshot().items.is_empty());
    assert!(remote.load("acme").await.unwrap().is_empty());
}

#[tokio::test]
async fn checkout_on_a_fresh_service_reports_missing_website() {
    let svc = CartService::new(
        MemoryStore::new(),
        MemoryStore::new(),
        CapturingGateway::default(),
        Arc::new(Guest),
    );
    let err = svc.checkout(customer()).await.unwrap_err();
    assert!(matches!(err, CartError::NoWebsite));
}
