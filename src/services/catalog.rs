//! Catalog service: fetches one backend page and renders listing views.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::backend::{CatalogBackend, Category, ProductQuery};
use crate::domain::aggregates::{Product, Variant};
use crate::domain::catalog::{compute_view, FilterState, SortKey, ViewResult};
use crate::{Result, StorefrontError};

pub const SALE_STRIP_SIZE: usize = 6;
pub const ARRIVALS_SIZE: usize = 8;
pub const CATEGORY_GRID_SIZE: u32 = 10;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProductDetail {
    pub product: Product,
    pub variants: Vec<Variant>,
    /// Variant to preselect: the only one when there is exactly one.
    pub default_variant_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SaleItem {
    pub product: Product,
    pub discount_percent: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HomeSections {
    pub sale: Vec<SaleItem>,
    pub arrivals: Vec<Product>,
    pub categories: Vec<Category>,
}

#[derive(Clone)]
pub struct CatalogService {
    backend: Arc<dyn CatalogBackend>,
    fetch_size: u32,
}

impl CatalogService {
    pub fn new(backend: Arc<dyn CatalogBackend>, fetch_size: u32) -> Self {
        Self { backend, fetch_size: fetch_size.max(1) }
    }

    // The engine sorts client-side, so the fetch carries no server ordering.
    async fn fetch_products(&self) -> Result<Vec<Product>> {
        let page = self.backend.list_products(&ProductQuery::first_page(self.fetch_size)).await?;
        debug!(fetched = page.data.len(), total = page.total, "catalogue page loaded");
        Ok(page.data)
    }

    pub async fn list_view(&self, filters: &FilterState) -> Result<ViewResult> {
        let products = self.fetch_products().await?;
        Ok(compute_view(&products, filters))
    }

    /// Same listing, ordered by popularity unless the caller chose otherwise.
    pub async fn best_sellers(&self, filters: &FilterState, sort: Option<SortKey>) -> Result<ViewResult> {
        let mut filters = filters.clone();
        filters.sort_key = sort.unwrap_or(SortKey::BestSelling);
        self.list_view(&filters).await
    }

    /// The product record alone, without fetching its variants.
    pub async fn product(&self, slug: &str) -> Result<Product> {
        self.backend.product_by_slug(slug).await?.ok_or_else(|| StorefrontError::ProductNotFound(slug.to_string()))
    }

    pub async fn product_detail(&self, slug: &str) -> Result<ProductDetail> {
        let mut product = self.product(slug).await?;
        let variants = self.backend.variants_by_slug(slug).await?;
        product.replace_variants(variants.clone());
        let default_variant_id = match variants.as_slice() {
            [only] => Some(only.id.clone()),
            _ => None,
        };
        Ok(ProductDetail { product, variants, default_variant_id })
    }

    pub async fn categories(&self) -> Result<Vec<Category>> {
        Ok(self.backend.list_categories(1, CATEGORY_GRID_SIZE).await?.data)
    }

    pub async fn home(&self) -> Result<HomeSections> {
        let products = self.fetch_products().await?;

        let mut sale_filter = FilterState::default().with_sort(SortKey::DiscountDesc).with_page_size(SALE_STRIP_SIZE);
        sale_filter.set_discounted_only(true);
        let sale: Vec<SaleItem> = compute_view(&products, &sale_filter)
            .items
            .into_iter()
            .map(|product| SaleItem { discount_percent: product.discount_percent(), product })
            .collect();

        let arrivals = compute_view(&products, &FilterState::default().with_sort(SortKey::Newest).with_page_size(ARRIVALS_SIZE)).items;
        let categories = self.categories().await?;
        info!(sale = sale.len(), arrivals = arrivals.len(), categories = categories.len(), "home sections built");
        Ok(HomeSections { sale, arrivals, categories })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, InMemoryBackend};
    use crate::domain::value_objects::{Money, Quantity};

    fn backend() -> Arc<InMemoryBackend> {
        let products = (1..=12u32)
            .map(|i| {
                let p = Product::new(i.to_string(), format!("Item {i}"), Money::idr(100_000 * u64::from(i)))
                    .with_slug(format!("item-{i}"))
                    .with_stock(i % 3)
                    .with_review_count(i * 10 % 70);
                if i % 2 == 0 { p.with_compare_at_price(Money::idr(100_000 * u64::from(i) + 10_000 * u64::from(i * i))) } else { p }
            })
            .collect();
        let categories = vec![Category { id: "1".into(), name: "Hoodie".into(), slug: "hoodie".into(), image_url: None }];
        Arc::new(InMemoryBackend::new(products, categories))
    }

    #[tokio::test]
    async fn test_list_view_uses_engine() {
        let service = CatalogService::new(backend(), 50);
        let view = service.list_view(&FilterState::default().with_sort(SortKey::PriceDesc)).await.unwrap();
        assert_eq!(view.total_matched, 12);
        assert_eq!(view.items[0].id(), "12");
        assert_eq!(view.total_pages, 2);
    }

    #[tokio::test]
    async fn test_fetch_size_bounds_the_view() {
        let service = CatalogService::new(backend(), 5);
        let view = service.list_view(&FilterState::default()).await.unwrap();
        assert_eq!(view.total_matched, 5);
    }

    #[tokio::test]
    async fn test_best_sellers_default_sort() {
        let service = CatalogService::new(backend(), 50);
        let view = service.best_sellers(&FilterState::default(), None).await.unwrap();
        let reviews: Vec<u32> = view.items.iter().map(Product::review_count).collect();
        assert!(reviews.windows(2).all(|w| w[0] >= w[1]));
        let by_price = service.best_sellers(&FilterState::default(), Some(SortKey::PriceAsc)).await.unwrap();
        assert_eq!(by_price.items[0].id(), "1");
    }

    #[tokio::test]
    async fn test_product_detail_and_not_found() {
        let backend = backend();
        backend
            .set_variants("item-4", vec![Variant { id: "40".into(), name: "M".into(), price: Money::idr(400_000), stock: Quantity::new(2), sku: None }])
            .await;
        let service = CatalogService::new(backend, 50);
        let detail = service.product_detail("item-4").await.unwrap();
        assert_eq!(detail.product.variants().len(), 1);
        assert_eq!(detail.default_variant_id.as_deref(), Some("40"));

        let missing = service.product_detail("nope").await.unwrap_err();
        assert_eq!(missing, StorefrontError::ProductNotFound("nope".into()));
    }

    #[tokio::test]
    async fn test_home_sections() {
        let service = CatalogService::new(backend(), 50);
        let home = service.home().await.unwrap();
        assert_eq!(home.sale.len(), SALE_STRIP_SIZE);
        assert!(home.sale.iter().all(|s| s.discount_percent > 0));
        assert!(home.sale.windows(2).all(|w| w[0].discount_percent >= w[1].discount_percent));
        assert_eq!(home.arrivals.len(), ARRIVALS_SIZE);
        assert_eq!(home.arrivals[0].id(), "12");
        assert_eq!(home.categories.len(), 1);
    }

    #[tokio::test]
    async fn test_backend_failure_surfaces() {
        let backend = backend();
        backend.set_failure(Some(BackendError::Status(500))).await;
        let service = CatalogService::new(backend, 50);
        let err = service.list_view(&FilterState::default()).await.unwrap_err();
        assert_eq!(err, StorefrontError::Backend(BackendError::Status(500)));
    }
}
