use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub cart_db_url: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_base_url =
            env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:8000/api".into());
        let cart_db_url = env::var("CART_DB_URL").ok();
        Ok(Self {
            api_base_url,
            cart_db_url,
        })
    }
}
