//! HTTP client for the catalogue REST backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::payload::{categories_from_page, products_from_page, Category, Envelope, Paginated, RawProduct, VariantList};
use super::{is_safe_slug, BackendError, CatalogBackend, ProductQuery};
use crate::domain::aggregates::{Product, Variant};

#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    pub base_url: String,
    pub currency: String,
    pub timeout: Duration,
}

pub struct HttpBackend {
    config: HttpBackendConfig,
    client: Client,
}

impl HttpBackend {
    pub fn new(config: HttpBackendConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    /// GET `path` and unwrap the `{code, message, data}` envelope.
    /// Returns `Ok(None)` on 404.
    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<Option<T>, BackendError> {
        let url = self.url(path);
        debug!(%url, ?query, "backend request");
        let response = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .query(query)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            warn!(%url, %status, "backend returned an error status");
            return Err(BackendError::Status(status.as_u16()));
        }

        let envelope: Envelope<T> = response.json().await.map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(Some(envelope.data))
    }

    fn normalize_products(&self, page: Paginated<Value>) -> Paginated<Product> {
        let received = page.data.len();
        let page = products_from_page(page, &self.config.currency);
        if page.data.len() < received {
            warn!(skipped = received - page.data.len(), "dropped unusable product records");
        }
        page
    }
}

#[async_trait]
impl CatalogBackend for HttpBackend {
    async fn list_products(&self, query: &ProductQuery) -> Result<Paginated<Product>, BackendError> {
        let mut params = vec![("page", query.page.to_string()), ("paginate", query.paginate.to_string())];
        if let Some(merk) = query.product_merk_id {
            params.push(("product_merk_id", merk.to_string()));
        }
        if let Some(order) = query.order_by {
            params.push(("order_by", order.as_param().to_string()));
        }
        let page: Paginated<Value> = self.get("public/products", &params).await?.ok_or(BackendError::Status(404))?;
        Ok(self.normalize_products(page))
    }

    async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>, BackendError> {
        if !is_safe_slug(slug) { return Ok(None); }
        let raw: Option<RawProduct> = self.get(&format!("public/products/{slug}"), &[]).await?;
        Ok(raw.and_then(|p| p.normalize(&self.config.currency)))
    }

    async fn variants_by_slug(&self, slug: &str) -> Result<Vec<Variant>, BackendError> {
        if !is_safe_slug(slug) { return Ok(Vec::new()); }
        let raw: Option<VariantList> = self.get(&format!("shop/products/{slug}/variants"), &[]).await?;
        Ok(raw
            .map(VariantList::into_vec)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|v| v.normalize(&self.config.currency))
            .collect())
    }

    async fn list_categories(&self, page: u32, paginate: u32) -> Result<Paginated<Category>, BackendError> {
        let params = [("page", page.to_string()), ("paginate", paginate.to_string()), ("is_parent", "1".to_string())];
        let raw: Paginated<Value> = self.get("public/product-categories", &params).await?.ok_or(BackendError::Status(404))?;
        Ok(categories_from_page(raw))
    }
}
