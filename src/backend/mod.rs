//! Catalogue backend boundary
//!
//! Everything that talks to the remote REST API lives here, together with
//! the one normalization step that turns its payloads into strict records.

pub mod client;
pub mod memory;
pub mod payload;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::aggregates::{Product, Variant};
pub use client::{HttpBackend, HttpBackendConfig};
pub use memory::InMemoryBackend;
pub use payload::{Category, Paginated};

/// Fetch failures. The message is shown to shoppers as-is ("load failed").
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("Failed to reach the catalogue service: {0}")]
    Transport(String),
    #[error("Catalogue service returned status {0}")]
    Status(u16),
    #[error("Unexpected catalogue response: {0}")]
    Decode(String),
}

/// Server-side ordering supported by the product endpoint. Independent of
/// the view engine's sort keys; a listing uses one or the other.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerOrder {
    Sales,
}

impl ServerOrder {
    pub fn as_param(self) -> &'static str {
        match self {
            Self::Sales => "sales",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductQuery {
    pub page: u32,
    pub paginate: u32,
    pub product_merk_id: Option<u64>,
    pub order_by: Option<ServerOrder>,
}

impl ProductQuery {
    pub fn first_page(paginate: u32) -> Self {
        Self { page: 1, paginate, product_merk_id: None, order_by: None }
    }
}

#[async_trait]
pub trait CatalogBackend: Send + Sync {
    async fn list_products(&self, query: &ProductQuery) -> Result<Paginated<Product>, BackendError>;
    async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>, BackendError>;
    async fn variants_by_slug(&self, slug: &str) -> Result<Vec<Variant>, BackendError>;
    async fn list_categories(&self, page: u32, paginate: u32) -> Result<Paginated<Category>, BackendError>;
}

/// Slugs end up in backend URL paths.
pub fn is_safe_slug(slug: &str) -> bool {
    !slug.is_empty() && slug.len() <= 200 && slug.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_safe_slug() {
        assert!(is_safe_slug("oversized-hoodie_02"));
        assert!(!is_safe_slug(""));
        assert!(!is_safe_slug("../admin"));
        assert!(!is_safe_slug("tee?x=1"));
    }
}
