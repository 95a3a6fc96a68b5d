use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use cart_types::domain::item::{CartItem, ItemPatch, ItemRecord, Product};
use cart_types::domain::order::{CustomerInfo, OrderReceipt};
use cart_types::domain::website::Website;
use cart_types::ports::auth_gate::AuthGate;
use cart_types::ports::cart_store::{CartStore, StoreError};
use cart_types::ports::order_gateway::OrderGateway;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::application::checkout;
use crate::errors::CartError;
use crate::normalize;

/// UI-facing cart snapshot. `total` is recomputed from `items` inside every
/// publish, so observers never see the two out of sync.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub total: f64,
    pub website: Option<Website>,
    pub loading: bool,
    pub error: Option<String>,
}

fn cart_total(items: &[CartItem]) -> f64 {
    items.iter().map(CartItem::line_total).sum()
}

// Sets `loading` on construction and releases it on every exit path,
// including early `?` returns.
struct LoadingGuard<'a> {
    state: &'a watch::Sender<Cart>,
}

impl<'a> LoadingGuard<'a> {
    fn begin(state: &'a watch::Sender<Cart>) -> Self {
        state.send_modify(|cart| cart.loading = true);
        Self { state }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|cart| cart.loading = false);
    }
}

/// The cart state engine: owns the aggregate for the bound website, routes
/// persistence through the remote or local adapter depending on the auth
/// gate, and publishes snapshots on a watch channel.
///
/// Which adapter handles an operation is decided at that operation's entry,
/// never cached, so login/logout transitions apply to the next action.
pub struct CartService<R, L, O> {
    remote: R,
    local: L,
    orders: O,
    auth: Arc<dyn AuthGate>,
    state: watch::Sender<Cart>,
    epoch: AtomicU64,
}

impl<R, L, O> CartService<R, L, O>
where
    R: CartStore,
    L: CartStore,
    O: OrderGateway,
{
    pub fn new(remote: R, local: L, orders: O, auth: Arc<dyn AuthGate>) -> Self {
        let (state, _) = watch::channel(Cart::default());
        Self {
            remote,
            local,
            orders,
            auth,
            state,
            epoch: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> Cart {
        self.state.borrow().clone()
    }

    /// Observers receive every published snapshot; a dropped receiver never
    /// errors the engine.
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.state.subscribe()
    }

    fn store_for(&self, authenticated: bool) -> &dyn CartStore {
        if authenticated {
            &self.remote
        } else {
            &self.local
        }
    }

    // Every item mutation goes through here: the epoch bump is what lets an
    // in-flight reconcile detect that it has gone stale.
    fn publish(&self, mutate: impl FnOnce(&mut Cart)) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.state.send_modify(|cart| {
            mutate(cart);
            cart.total = cart_total(&cart.items);
        });
    }

    fn set_error(&self, message: Option<String>) {
        self.state.send_modify(|cart| cart.error = message);
    }

    fn bound_website(&self) -> Result<Website, CartError> {
        self.state.borrow().website.clone().ok_or(CartError::NoWebsite)
    }

    /// Binds the cart to a website. Pure state update: rebinding the same
    /// slug only refreshes id/name, a different slug resets the aggregate.
    /// Hosts follow a rebind with `refresh()` to load that website's items.
    pub fn set_website_info(&self, website: Website) {
        let same_slug = self
            .state
            .borrow()
            .website
            .as_ref()
            .map(|current| current.slug == website.slug)
            .unwrap_or(false);
        self.publish(move |cart| {
            if !same_slug {
                cart.items.clear();
                cart.error = None;
            }
            cart.website = Some(website);
        });
    }

    /// Loads the bound website's items from the selected adapter and
    /// replaces the aggregate with the normalized result.
    pub async fn refresh(&self) -> Result<(), CartError> {
        let _busy = LoadingGuard::begin(&self.state);
        let website = self.bound_website()?;
        let authenticated = self.auth.is_authenticated();

        match self.store_for(authenticated).load(&website.slug).await {
            Ok(records) => {
                let items = normalize::normalize_records(records);
                self.publish(move |cart| {
                    cart.items = items;
                    cart.error = None;
                });
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, website = %website.slug, "cart load failed");
                self.set_error(Some(err.to_string()));
                Err(err.into())
            }
        }
    }

    /// Adds a product, or bumps the quantity of the existing line for the
    /// same `(website, product)` pair. The item list is published
    /// optimistically before the adapter confirms; the authenticated path
    /// then chains an authoritative reload to fold in server-assigned ids.
    /// On adapter failure the optimistic state is kept and the error is
    /// reported.
    pub async fn add_to_cart(&self, product: Product, quantity: u32) -> Result<(), CartError> {
        let _busy = LoadingGuard::begin(&self.state);
        let website = self.bound_website()?;
        let authenticated = self.auth.is_authenticated();
        let quantity = quantity.max(1);

        let existing = self
            .state
            .borrow()
            .items
            .iter()
            .find(|line| line.website_slug == website.slug && line.product_id == product.id)
            .cloned();

        let outcome = match existing {
            Some(line) => {
                let bumped = line.quantity + quantity;
                let product_id = line.product_id.clone();
                self.publish(move |cart| {
                    if let Some(line) = cart.items.iter_mut().find(|l| l.product_id == product_id)
                    {
                        line.quantity = bumped;
                    }
                });
                self.store_for(authenticated)
                    .update(&line.id, ItemPatch::quantity(bumped))
                    .await
                    .map(|_| ())
            }
            None => {
                let item = normalize::item_from_product(product, quantity, &website.slug);
                let record = if authenticated {
                    normalize::outbound_record(&item)
                } else {
                    ItemRecord::from(item.clone())
                };
                self.publish(move |cart| cart.items.push(item));
                self.store_for(authenticated).add(record).await.map(|_| ())
            }
        };

        match outcome {
            Ok(()) => {
                self.set_error(None);
                if authenticated {
                    self.reconcile(&website.slug).await;
                }
                Ok(())
            }
            Err(err) => {
                // The optimistic state stays; it is still the best local
                // truth we have.
                tracing::warn!(error = %err, website = %website.slug, "cart add failed");
                self.set_error(Some(err.to_string()));
                Err(err.into())
            }
        }
    }

    /// Sets a line's quantity. Non-positive quantities delegate to
    /// `remove_from_cart`. Unlike `add_to_cart`, a rejected update restores
    /// the pre-call item list exactly.
    pub async fn update_quantity(&self, product_id: &str, quantity: i64) -> Result<(), CartError> {
        if quantity <= 0 {
            return self.remove_from_cart(product_id).await;
        }
        let quantity = quantity as u32;

        let _busy = LoadingGuard::begin(&self.state);
        let website = self.bound_website()?;
        let authenticated = self.auth.is_authenticated();

        let previous = self.state.borrow().items.clone();
        let line = previous
            .iter()
            .find(|l| l.website_slug == website.slug && l.product_id == product_id)
            .cloned()
            .ok_or_else(|| CartError::ItemNotFound(product_id.to_string()))?;

        let target = product_id.to_string();
        self.publish(move |cart| {
            if let Some(line) = cart.items.iter_mut().find(|l| l.product_id == target) {
                line.quantity = quantity;
            }
        });

        match self
            .store_for(authenticated)
            .update(&line.id, ItemPatch::quantity(quantity))
            .await
        {
            Ok(_) => {
                self.set_error(None);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, product_id, "quantity update rejected, rolling back");
                self.publish(move |cart| cart.items = previous);
                self.set_error(Some(err.to_string()));
                Err(err.into())
            }
        }
    }

    /// Removes the line for a product. Removing what is not there is a
    /// no-op. The authenticated path reloads the authoritative list after
    /// the adapter confirms.
    pub async fn remove_from_cart(&self, product_id: &str) -> Result<(), CartError> {
        let _busy = LoadingGuard::begin(&self.state);
        let website = self.bound_website()?;
        let authenticated = self.auth.is_authenticated();

        let Some(line) = self
            .state
            .borrow()
            .items
            .iter()
            .find(|l| l.website_slug == website.slug && l.product_id == product_id)
            .cloned()
        else {
            return Ok(());
        };

        let target = product_id.to_string();
        self.publish(move |cart| cart.items.retain(|l| l.product_id != target));

        match self.store_for(authenticated).remove(&line.id).await {
            Ok(_) => {
                self.set_error(None);
                if authenticated {
                    self.reconcile(&website.slug).await;
                }
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, product_id, "cart removal failed");
                self.set_error(Some(err.to_string()));
                Err(err.into())
            }
        }
    }

    /// Empties the aggregate and the storage backends for the bound website
    /// (both backends when authenticated). Safe to call on an already-empty
    /// cart.
    pub async fn clear_cart(&self) -> Result<(), CartError> {
        let _busy = LoadingGuard::begin(&self.state);
        self.clear_inner().await
    }

    async fn clear_inner(&self) -> Result<(), CartError> {
        let website = self.state.borrow().website.clone();
        self.publish(|cart| cart.items.clear());
        let Some(website) = website else {
            return Ok(());
        };

        let mut outcome: Result<(), StoreError> = self.local.clear(&website.slug).await;
        if outcome.is_ok() && self.auth.is_authenticated() {
            outcome = self.remote.clear(&website.slug).await;
        }
        match outcome {
            Ok(()) => {
                self.set_error(None);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, website = %website.slug, "cart clear failed");
                self.set_error(Some(err.to_string()));
                Err(err.into())
            }
        }
    }

    /// Runs the checkout: ordered precondition checks, order submission,
    /// then clearing the cart exactly once. A clear failure after the order
    /// is committed server-side is logged and does not fail the checkout; a
    /// failure at any earlier step leaves the cart untouched.
    pub async fn checkout(&self, customer: CustomerInfo) -> Result<OrderReceipt, CartError> {
        let _busy = LoadingGuard::begin(&self.state);

        let validated = {
            let cart = self.state.borrow();
            checkout::validate(&cart, &customer)
                .map(|website| checkout::build_draft(website, &cart.items, cart.total, customer.clone()))
        };
        let draft = match validated {
            Ok(draft) => draft,
            Err(err) => {
                self.set_error(Some(err.to_string()));
                return Err(err);
            }
        };

        match self.orders.create_order(draft).await {
            Ok(receipt) => {
                self.set_error(None);
                // The order is committed server-side; a failed clear must
                // not unwind the checkout.
                if let Err(err) = self.clear_inner().await {
                    tracing::warn!(error = %err, order_id = %receipt.id, "cart clear failed after checkout");
                }
                Ok(receipt)
            }
            Err(err) => {
                tracing::warn!(error = %err, "checkout failed");
                self.set_error(Some(err.to_string()));
                Err(err.into())
            }
        }
    }

    // Authoritative reload after a remote mutation settles. Guarded by the
    // mutation epoch: if anything else published while the load was in
    // flight, the result is stale and dropped (newest mutation wins).
    async fn reconcile(&self, website_slug: &str) {
        let issued_at = self.epoch.load(Ordering::SeqCst);
        match self.remote.load(website_slug).await {
            Ok(records) => {
                let items = normalize::normalize_records(records);
                if self.epoch.load(Ordering::SeqCst) == issued_at {
                    self.publish(move |cart| cart.items = items);
                } else {
                    tracing::debug!(website_slug, "discarding stale cart reconcile");
                }
            }
            Err(err) => {
                // The optimistic state remains the best available.
                tracing::warn!(error = %err, website_slug, "cart reconcile failed");
            }
        }
    }
}
