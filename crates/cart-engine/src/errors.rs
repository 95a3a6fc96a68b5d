use cart_types::ports::cart_store::StoreError;
use cart_types::ports::order_gateway::GatewayError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CartError {
    #[error("no website bound to this cart")]
    NoWebsite,

    #[error("cart is empty")]
    EmptyCart,

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("item not in cart: {0}")]
    ItemNotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
