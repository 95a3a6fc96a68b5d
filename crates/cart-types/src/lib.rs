//! cart-types: domain records and port traits shared across the cart workspace.

pub mod domain;
pub mod ports;
