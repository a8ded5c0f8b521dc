//! In-memory catalogue backend. The service and handler tests run against it.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{BackendError, CatalogBackend, Category, Paginated, ProductQuery, ServerOrder};
use crate::domain::aggregates::{Product, Variant};

#[derive(Default)]
pub struct InMemoryBackend {
    products: RwLock<Vec<Product>>,
    variants: RwLock<HashMap<String, Vec<Variant>>>,
    categories: RwLock<Vec<Category>>,
    failure: RwLock<Option<BackendError>>,
}

impl InMemoryBackend {
    pub fn new(products: Vec<Product>, categories: Vec<Category>) -> Self {
        Self { products: RwLock::new(products), categories: RwLock::new(categories), ..Default::default() }
    }

    pub async fn set_variants(&self, slug: impl Into<String>, variants: Vec<Variant>) {
        self.variants.write().await.insert(slug.into(), variants);
    }

    /// Makes every subsequent call fail with `error` (or succeed again with `None`).
    pub async fn set_failure(&self, error: Option<BackendError>) {
        *self.failure.write().await = error;
    }

    async fn check(&self) -> Result<(), BackendError> {
        match self.failure.read().await.as_ref() {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

fn paginate<T: Clone>(items: &[T], page: u32, per_page: u32) -> Paginated<T> {
    let per_page = per_page.max(1);
    let total = items.len() as u64;
    let last_page = (items.len() as u32).div_ceil(per_page).max(1);
    let start = ((page.max(1) - 1) * per_page) as usize;
    let data = items.iter().skip(start).take(per_page as usize).cloned().collect();
    Paginated { current_page: page.max(1), data, last_page, total, per_page }
}

#[async_trait]
impl CatalogBackend for InMemoryBackend {
    async fn list_products(&self, query: &ProductQuery) -> Result<Paginated<Product>, BackendError> {
        self.check().await?;
        let mut products = self.products.read().await.clone();
        if query.order_by == Some(ServerOrder::Sales) {
            products.sort_by_key(|p| std::cmp::Reverse(p.sales().unwrap_or(0)));
        }
        Ok(paginate(&products, query.page, query.paginate))
    }

    async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>, BackendError> {
        self.check().await?;
        Ok(self.products.read().await.iter().find(|p| p.slug() == slug).cloned())
    }

    async fn variants_by_slug(&self, slug: &str) -> Result<Vec<Variant>, BackendError> {
        self.check().await?;
        Ok(self.variants.read().await.get(slug).cloned().unwrap_or_default())
    }

    async fn list_categories(&self, page: u32, paginate_by: u32) -> Result<Paginated<Category>, BackendError> {
        self.check().await?;
        let categories = self.categories.read().await;
        Ok(paginate(categories.as_slice(), page, paginate_by))
    }
}
