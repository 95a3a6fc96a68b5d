//! cart-engine: client-side cart state engine and checkout orchestrator.

pub mod config;
pub mod errors;
pub mod normalize;

pub mod application;

pub use cart_types::{domain, ports};
