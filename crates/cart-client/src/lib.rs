use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use cart_types::domain::item::{ItemPatch, ItemRecord};
use cart_types::domain::order::{OrderDraft, OrderReceipt};
use cart_types::ports::auth_gate::AuthGate;
use cart_types::ports::cart_store::{CartStore, StoreError};
use cart_types::ports::order_gateway::{GatewayError, OrderGateway};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode, Url};
use serde::Deserialize;

pub mod session;

pub use session::BearerSession;

#[derive(Clone)]
pub struct StorefrontClientBuilder {
    base: Url,
    headers: HeaderMap,
    timeout: Option<Duration>,
    client: Option<reqwest::Client>,
    auth: Option<Arc<dyn AuthGate>>,
}

/// HTTP client for the storefront backend: the remote cart adapter plus the
/// order-creation gateway. The bearer token is fetched from the auth gate on
/// every request, so a login or logout mid-session applies immediately.
#[derive(Clone)]
pub struct StorefrontClient {
    base: Url,
    client: reqwest::Client,
    auth: Arc<dyn AuthGate>,
}

// Some list endpoints page their results; accept both shapes.
#[derive(Deserialize)]
#[serde(untagged)]
enum ItemListBody {
    Paged { results: Vec<ItemRecord> },
    Plain(Vec<ItemRecord>),
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
    detail: Option<String>,
}

// The backend reports failures under several keys depending on the view.
async fn api_error(res: reqwest::Response) -> String {
    let status = res.status();
    match res.json::<ApiErrorBody>().await {
        Ok(body) => body
            .error
            .or(body.message)
            .or(body.detail)
            .unwrap_or_else(|| format!("http status {status}")),
        Err(_) => format!("http status {status}"),
    }
}

fn backend(err: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(err.to_string())
}

impl StorefrontClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Self::builder(base_url)?.build()
    }

    pub fn builder(base_url: &str) -> anyhow::Result<StorefrontClientBuilder> {
        let mut base = Url::parse(base_url).context("invalid base url")?;
        // Url::join treats a path without a trailing slash as a file.
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        Ok(StorefrontClientBuilder {
            base,
            headers: HeaderMap::new(),
            timeout: None,
            client: None,
            auth: None,
        })
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.base.join(path).context("failed to join url")
    }

    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        let mut req = self.client.request(method, url);
        if let Some(token) = self.auth.current_token() {
            req = req.bearer_auth(token);
        }
        req
    }

    pub async fn get_order(&self, id: &str) -> anyhow::Result<OrderReceipt> {
        let res = self
            .request(Method::GET, self.url(&format!("orders/{id}/"))?)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }
}

#[async_trait]
impl CartStore for StorefrontClient {
    async fn load(&self, website_slug: &str) -> Result<Vec<ItemRecord>, StoreError> {
        let url = self.url("cart/").map_err(backend)?;
        let res = self
            .request(Method::GET, url)
            .query(&[("website_slug", website_slug)])
            .send()
            .await
            .map_err(backend)?;
        if !res.status().is_success() {
            return Err(StoreError::Backend(api_error(res).await));
        }
        let body: ItemListBody = res.json().await.map_err(backend)?;
        Ok(match body {
            ItemListBody::Paged { results } => results,
            ItemListBody::Plain(items) => items,
        })
    }

    async fn add(&self, record: ItemRecord) -> Result<ItemRecord, StoreError> {
        let url = self.url("cart/add_to_cart/").map_err(backend)?;
        let res = self
            .request(Method::POST, url)
            .json(&record)
            .send()
            .await
            .map_err(backend)?;
        if !res.status().is_success() {
            return Err(StoreError::Backend(api_error(res).await));
        }
        res.json().await.map_err(backend)
    }

    async fn update(
        &self,
        item_id: &str,
        patch: ItemPatch,
    ) -> Result<Option<ItemRecord>, StoreError> {
        let url = self.url(&format!("cart/{item_id}/")).map_err(backend)?;
        let res = self
            .request(Method::PATCH, url)
            .json(&patch)
            .send()
            .await
            .map_err(backend)?;
        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !res.status().is_success() {
            return Err(StoreError::Backend(api_error(res).await));
        }
        Ok(Some(res.json().await.map_err(backend)?))
    }

    async fn remove(&self, item_id: &str) -> Result<bool, StoreError> {
        let url = self.url(&format!("cart/{item_id}/")).map_err(backend)?;
        let res = self
            .request(Method::DELETE, url)
            .send()
            .await
            .map_err(backend)?;
        if res.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !res.status().is_success() {
            return Err(StoreError::Backend(api_error(res).await));
        }
        Ok(true)
    }

    async fn clear(&self, website_slug: &str) -> Result<(), StoreError> {
        let url = self.url("cart/clear_cart/").map_err(backend)?;
        let res = self
            .request(Method::DELETE, url)
            .query(&[("website_slug", website_slug)])
            .send()
            .await
            .map_err(backend)?;
        if !res.status().is_success() {
            return Err(StoreError::Backend(api_error(res).await));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderGateway for StorefrontClient {
    async fn create_order(&self, draft: OrderDraft) -> Result<OrderReceipt, GatewayError> {
        let url = self
            .url("orders/create_order/")
            .map_err(|e| GatewayError::Api(e.to_string()))?;
        let res = self
            .request(Method::POST, url)
            .json(&draft)
            .send()
            .await
            .map_err(|e| GatewayError::Api(e.to_string()))?;
        if !res.status().is_success() {
            return Err(GatewayError::Api(api_error(res).await));
        }
        res.json().await.map_err(|e| GatewayError::Api(e.to_string()))
    }
}

impl StorefrontClientBuilder {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_header(
        mut self,
        key: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> anyhow::Result<Self> {
        let header_name =
            HeaderName::from_bytes(key.as_ref().as_bytes()).context("invalid header name")?;
        let header_value = HeaderValue::from_str(value.as_ref()).context("invalid header value")?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    pub fn with_auth(mut self, auth: Arc<dyn AuthGate>) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn with_reqwest_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> anyhow::Result<StorefrontClient> {
        let auth = self
            .auth
            .unwrap_or_else(|| Arc::new(BearerSession::new()) as Arc<dyn AuthGate>);

        if let Some(client) = self.client {
            return Ok(StorefrontClient {
                base: self.base,
                client,
                auth,
            });
        }

        let mut builder = reqwest::Client::builder();
        if !self.headers.is_empty() {
            builder = builder.default_headers(self.headers);
        }
        if let Some(t) = self.timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build()?;
        Ok(StorefrontClient {
            base: self.base,
            client,
            auth,
        })
    }
}
