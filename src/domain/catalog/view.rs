//! Catalogue view engine: filter, sort, paginate.

use serde::Serialize;
use std::cmp::{Ordering, Reverse};
use crate::domain::aggregates::Product;
use super::filter::{FilterState, SortKey};

/// One rendered page of a listing plus its "Showing X–Y of Z" summary.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ViewResult {
    pub items: Vec<Product>,
    pub total_matched: usize,
    pub total_pages: usize,
    pub page: usize,
    pub page_size: usize,
    /// 1-based, inclusive. Zero when nothing matched.
    pub range_start: usize,
    pub range_end: usize,
}

pub fn compute_view(products: &[Product], filters: &FilterState) -> ViewResult {
    let page_size = filters.page_size.max(1);

    let needle = filters.search_needle();
    let mut matched: Vec<&Product> = products.iter().filter(|p| filters.admits(p, needle.as_deref())).collect();
    sort_products(&mut matched, filters.sort_key);

    let total_matched = matched.len();
    let total_pages = total_matched.div_ceil(page_size).max(1);
    let page = filters.page.clamp(1, total_pages);

    let start = ((page - 1) * page_size).min(total_matched);
    let end = (start + page_size).min(total_matched);
    let (range_start, range_end) = if total_matched == 0 { (0, 0) } else { (start + 1, end) };

    ViewResult {
        items: matched[start..end].iter().map(|p| (*p).clone()).collect(),
        total_matched, total_pages, page, page_size, range_start, range_end,
    }
}

/// Stable sort; equal keys keep their input order.
pub fn sort_products(products: &mut [&Product], key: SortKey) {
    match key {
        SortKey::PriceAsc => products.sort_by_key(|p| p.price().amount()),
        SortKey::PriceDesc => products.sort_by_key(|p| Reverse(p.price().amount())),
        SortKey::BestSelling => products.sort_by_key(|p| Reverse(p.review_count())),
        SortKey::DiscountDesc => products.sort_by(|a, b| b.cmp_discount(a)),
        SortKey::Newest => products.sort_by(|a, b| cmp_recency(b, a)),
    }
}

// Dated records rank above undated ones. Without a timestamp the numeric id
// stands in for recency; this is a known gap, not a real ordering.
fn cmp_recency(a: &Product, b: &Product) -> Ordering {
    a.created_at().cmp(&b.created_at()).then_with(|| a.numeric_id().cmp(&b.numeric_id()))
}
