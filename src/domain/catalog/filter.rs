//! Filter state for catalogue listings

use serde::{Deserialize, Serialize};
use crate::domain::aggregates::Product;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Fixed price facets offered on listing pages, in minor units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceBand {
    #[serde(rename = "lt310")]
    Below310k,
    #[serde(rename = "310to570")]
    From310kTo570k,
    #[serde(rename = "570to830")]
    From570kTo830k,
    #[serde(rename = "gte830")]
    From830k,
}

impl PriceBand {
    pub const ALL: [PriceBand; 4] = [Self::Below310k, Self::From310kTo570k, Self::From570kTo830k, Self::From830k];

    /// Half-open `[low, high)` bounds; the top band has no upper bound.
    pub fn bounds(self) -> (u64, Option<u64>) {
        match self {
            Self::Below310k => (0, Some(310_000)),
            Self::From310kTo570k => (310_000, Some(570_000)),
            Self::From570kTo830k => (570_000, Some(830_000)),
            Self::From830k => (830_000, None),
        }
    }

    pub fn contains(self, amount: u64) -> bool {
        let (low, high) = self.bounds();
        amount >= low && high.map_or(true, |high| amount < high)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    PriceAsc,
    PriceDesc,
    BestSelling,
    Newest,
    DiscountDesc,
}

/// User-editable listing state. Every setter except [`FilterState::set_page`]
/// sends the shopper back to the first page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    pub search_text: String,
    pub category: Option<String>,
    pub in_stock_only: bool,
    pub featured_only: bool,
    pub discounted_only: bool,
    pub price_band: Option<PriceBand>,
    pub sort_key: SortKey,
    pub page: usize,
    pub page_size: usize,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search_text: String::new(), category: None, in_stock_only: false, featured_only: false,
            discounted_only: false, price_band: None, sort_key: SortKey::default(),
            page: 1, page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl FilterState {
    pub fn with_sort(mut self, sort_key: SortKey) -> Self { self.set_sort_key(sort_key); self }
    pub fn with_page_size(mut self, page_size: usize) -> Self { self.set_page_size(page_size); self }
    pub fn with_page(mut self, page: usize) -> Self { self.set_page(page); self }

    pub fn set_search_text(&mut self, text: impl Into<String>) { self.search_text = text.into(); self.page = 1; }
    pub fn set_category(&mut self, category: Option<String>) { self.category = category; self.page = 1; }
    pub fn set_in_stock_only(&mut self, on: bool) { self.in_stock_only = on; self.page = 1; }
    pub fn set_featured_only(&mut self, on: bool) { self.featured_only = on; self.page = 1; }
    pub fn set_discounted_only(&mut self, on: bool) { self.discounted_only = on; self.page = 1; }
    pub fn set_price_band(&mut self, band: Option<PriceBand>) { self.price_band = band; self.page = 1; }
    pub fn set_sort_key(&mut self, sort_key: SortKey) { self.sort_key = sort_key; self.page = 1; }
    pub fn set_page_size(&mut self, page_size: usize) { self.page_size = page_size.max(1); self.page = 1; }
    pub fn set_page(&mut self, page: usize) { self.page = page.max(1); }

    /// True when both states select and order the same items.
    pub fn same_criteria(&self, other: &FilterState) -> bool {
        self.search_text.trim() == other.search_text.trim()
            && self.category == other.category
            && self.in_stock_only == other.in_stock_only
            && self.featured_only == other.featured_only
            && self.discounted_only == other.discounted_only
            && self.price_band == other.price_band
            && self.sort_key == other.sort_key
            && self.page_size == other.page_size
    }

    /// Applies an incoming state on top of `previous`, discarding a stale
    /// page number when anything besides the page changed.
    pub fn reconcile(mut self, previous: &FilterState) -> FilterState {
        if !self.same_criteria(previous) { self.page = 1; }
        self
    }

    pub(crate) fn search_needle(&self) -> Option<String> {
        let trimmed = self.search_text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
    }

    pub(crate) fn admits(&self, product: &Product, needle: Option<&str>) -> bool {
        if let Some(needle) = needle {
            if !product.matches_text(needle) { return false; }
        }
        if let Some(category) = &self.category {
            if product.category() != category { return false; }
        }
        if self.in_stock_only && !product.is_in_stock() { return false; }
        if self.featured_only && !product.is_featured() { return false; }
        if self.discounted_only && !product.is_discounted() { return false; }
        if let Some(band) = self.price_band {
            if !band.contains(product.price().amount()) { return false; }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_band_edges() {
        assert!(PriceBand::Below310k.contains(309_999));
        assert!(!PriceBand::Below310k.contains(310_000));
        assert!(PriceBand::From310kTo570k.contains(310_000));
        assert!(!PriceBand::From570kTo830k.contains(830_000));
        assert!(PriceBand::From830k.contains(830_000));
        assert!(PriceBand::From830k.contains(u64::MAX));
        for amount in [0, 310_000, 569_999, 570_000, 9_000_000] {
            assert_eq!(PriceBand::ALL.iter().filter(|b| b.contains(amount)).count(), 1);
        }
    }

    #[test]
    fn test_setters_reset_page() {
        let mut state = FilterState::default().with_page(4);
        assert_eq!(state.page, 4);
        state.set_category(Some("hoodie".into()));
        assert_eq!(state.page, 1);
        state.set_page(3);
        state.set_discounted_only(true);
        assert_eq!(state.page, 1);
        state.set_page(0);
        assert_eq!(state.page, 1);
    }

    #[test]
    fn test_reconcile_discards_stale_page() {
        let previous = FilterState::default().with_page(3);
        let same = previous.clone().with_page(4).reconcile(&previous);
        assert_eq!(same.page, 4);

        let mut changed = previous.clone();
        changed.search_text = "tee".into();
        assert_eq!(changed.reconcile(&previous).page, 1);
    }

    #[test]
    fn test_serde_names() {
        let state: FilterState = serde_json::from_str(r#"{"price_band":"310to570","sort_key":"discount_desc"}"#).unwrap();
        assert_eq!(state.price_band, Some(PriceBand::From310kTo570k));
        assert_eq!(state.sort_key, SortKey::DiscountDesc);
        assert_eq!(state.page, 1);
        assert_eq!(state.page_size, DEFAULT_PAGE_SIZE);
    }
}
