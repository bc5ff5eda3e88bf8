use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};

use super::{CatalogCategory, CatalogError, CatalogItem, CatalogSource, ConnectionSettings, Page};

pub const SANDBOX_BASE_URL: &str = "https://sandbox.dev.clover.com";
pub const PRODUCTION_BASE_URL: &str = "https://api.clover.com";

/// Transport tuning for [`CloverClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub timeout: Duration,
    pub items_page_size: u32,
    pub categories_page_size: u32,
    /// Upper bound on pages followed per collection.
    pub max_pages: u32,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            items_page_size: 200,
            categories_page_size: 100,
            max_pages: 50,
        }
    }
}

/// HTTP client for the Clover v3 merchant inventory API.
#[derive(Clone)]
pub struct CloverClient {
    client: reqwest::Client,
    base_url: String,
    merchant_id: String,
    token: String,
    options: ClientOptions,
}

impl CloverClient {
    pub fn new(settings: &ConnectionSettings, options: ClientOptions) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder().timeout(options.timeout).build()?;
        let base_url = if settings.sandbox {
            SANDBOX_BASE_URL
        } else {
            PRODUCTION_BASE_URL
        };

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            merchant_id: settings.merchant_id.clone(),
            token: settings.token.clone(),
            options,
        })
    }

    /// Points the client at another host, e.g. a local mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v3/merchants/{}{}", self.base_url, self.merchant_id, path)
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Page<T>, CatalogError> {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/json")
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }

        response
            .json::<Page<T>>()
            .await
            .map_err(|e| CatalogError::Decode(format!("{}: {}", path, e)))
    }

    /// Follows `offset` pages until a short page or the page cap.
    async fn get_all<T: DeserializeOwned>(
        &self,
        path: &str,
        extra: &[(&str, &str)],
        page_size: u32,
    ) -> Result<Vec<T>, CatalogError> {
        let page_size = page_size.max(1);
        let mut collected = Vec::new();

        for page_index in 0..self.options.max_pages.max(1) {
            let Some(offset) = page_index.checked_mul(page_size) else {
                break;
            };
            let mut query = vec![
                ("limit", page_size.to_string()),
                ("offset", offset.to_string()),
            ];
            query.extend(extra.iter().map(|(k, v)| (*k, v.to_string())));

            let page: Page<T> = self.get_page(path, &query).await?;
            let fetched = page.elements.len();
            collected.extend(page.elements);
            debug!(path, offset, fetched, "fetched catalog page");

            if fetched < page_size as usize {
                break;
            }
        }

        Ok(collected)
    }
}

#[async_trait]
impl CatalogSource for CloverClient {
    #[instrument(skip(self), fields(merchant_id = %self.merchant_id))]
    async fn fetch_items(&self) -> Result<Vec<CatalogItem>, CatalogError> {
        self.get_all(
            "/items",
            &[("expand", "categories")],
            self.options.items_page_size,
        )
        .await
    }

    #[instrument(skip(self), fields(merchant_id = %self.merchant_id))]
    async fn fetch_categories(&self) -> Result<Vec<CatalogCategory>, CatalogError> {
        self.get_all("/categories", &[], self.options.categories_page_size)
            .await
    }
}
