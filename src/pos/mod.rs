//! External POS catalog.
//!
//! The catalog is read-only from this crate's point of view: two list
//! endpoints (items and categories) behind a bearer token and a merchant id.

use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;
use validator::Validate;

pub mod client;
pub mod types;

pub use client::{ClientOptions, CloverClient};
pub use types::{CatalogCategory, CatalogItem, CatalogSnapshot, ItemStock, Page};

/// Failures talking to the catalog. Any of them aborts a whole reconciliation.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("POS request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("POS API error: {status} on {path}")]
    Status { status: u16, path: String },

    #[error("Unexpected POS response: {0}")]
    Decode(String),
}

/// Read access to the authoritative catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_items(&self) -> Result<Vec<CatalogItem>, CatalogError>;

    async fn fetch_categories(&self) -> Result<Vec<CatalogCategory>, CatalogError>;

    /// Issues both fetches together and waits for both; either failure fails the snapshot.
    async fn fetch_snapshot(&self) -> Result<CatalogSnapshot, CatalogError> {
        let (items, categories) = tokio::try_join!(self.fetch_items(), self.fetch_categories())?;
        Ok(CatalogSnapshot { items, categories })
    }
}

/// Credentials entered by the store owner. Held in memory only.
#[derive(Clone, Deserialize, Validate)]
pub struct ConnectionSettings {
    #[validate(length(min = 1, message = "access token is required"))]
    pub token: String,

    #[validate(length(min = 1, message = "merchant id is required"))]
    pub merchant_id: String,

    /// Selects the sandbox endpoint instead of production.
    #[serde(default = "default_sandbox")]
    pub sandbox: bool,
}

fn default_sandbox() -> bool {
    true
}

impl ConnectionSettings {
    pub fn new(token: impl Into<String>, merchant_id: impl Into<String>, sandbox: bool) -> Self {
        Self {
            token: token.into(),
            merchant_id: merchant_id.into(),
            sandbox,
        }
    }
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("token", &"<redacted>")
            .field("merchant_id", &self.merchant_id)
            .field("sandbox", &self.sandbox)
            .finish()
    }
}
