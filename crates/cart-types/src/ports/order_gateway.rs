use async_trait::async_trait;

use crate::domain::order::{OrderDraft, OrderReceipt};

#[derive(thiserror::Error, Debug)]
pub enum GatewayError {
    #[error("order api error: {0}")]
    Api(String),
}

#[async_trait]
pub trait OrderGateway: Send + Sync + 'static {
    async fn create_order(&self, draft: OrderDraft) -> Result<OrderReceipt, GatewayError>;
}
