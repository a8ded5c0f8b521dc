//! Wishlist Aggregate

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use crate::domain::aggregates::product::Product;
use crate::domain::events::WishlistEvent;
use crate::domain::value_objects::Money;

/// Products a shopper saved for later. Each product appears at most once.
#[derive(Clone, Debug, Serialize)]
pub struct Wishlist {
    session_id: String,
    items: Vec<WishlistItem>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<WishlistEvent>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WishlistItem {
    pub product_id: String,
    pub slug: String,
    pub name: String,
    pub price: Money,
    pub image_url: Option<String>,
    pub added_at: DateTime<Utc>,
}

impl Wishlist {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self { session_id: session_id.into(), items: vec![], updated_at: Utc::now(), events: vec![] }
    }

    pub fn session_id(&self) -> &str { &self.session_id }
    pub fn items(&self) -> &[WishlistItem] { &self.items }
    pub fn len(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn contains(&self, product_id: &str) -> bool { self.items.iter().any(|i| i.product_id == product_id) }

    /// Saves `product`. Returns `false` when it was already saved.
    pub fn add(&mut self, product: &Product) -> bool {
        if self.contains(product.id()) { return false; }
        let now = Utc::now();
        self.items.push(WishlistItem {
            product_id: product.id().to_string(), slug: product.slug().to_string(), name: product.name().to_string(),
            price: product.price().clone(), image_url: product.image_url().map(str::to_string), added_at: now,
        });
        self.updated_at = now;
        self.raise_event(WishlistEvent::Added { product_id: product.id().to_string() });
        true
    }

    pub fn remove(&mut self, product_id: &str) -> Result<(), WishlistError> {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        if self.items.len() == before { return Err(WishlistError::ItemNotFound(product_id.to_string())); }
        self.updated_at = Utc::now();
        self.raise_event(WishlistEvent::Removed { product_id: product_id.to_string() });
        Ok(())
    }

    /// Removes `product` if saved, saves it otherwise. Returns whether it is
    /// saved afterwards.
    pub fn toggle(&mut self, product: &Product) -> bool {
        match self.remove(product.id()) {
            Ok(()) => false,
            Err(_) => self.add(product),
        }
    }

    pub fn take_events(&mut self) -> Vec<WishlistEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: WishlistEvent) { self.events.push(e); }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WishlistError {
    #[error("Product {0} is not in the wishlist")]
    ItemNotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cap() -> Product { Product::new("P3", "Dad Cap", Money::idr(129_000)).with_slug("dad-cap") }

    #[test]
    fn test_add_is_idempotent() {
        let mut list = Wishlist::new("s1");
        assert!(list.add(&cap()));
        assert!(!list.add(&cap()));
        assert_eq!(list.len(), 1);
        assert_eq!(list.items()[0].slug, "dad-cap");
        assert_eq!(list.take_events(), vec![WishlistEvent::Added { product_id: "P3".into() }]);
    }

    #[test]
    fn test_remove_and_toggle() {
        let mut list = Wishlist::new("s1");
        assert_eq!(list.remove("P3"), Err(WishlistError::ItemNotFound("P3".into())));
        assert!(list.toggle(&cap()));
        assert!(list.contains("P3"));
        assert!(!list.toggle(&cap()));
        assert!(list.is_empty());
        let names: Vec<_> = list.take_events().iter().map(WishlistEvent::name).collect();
        assert_eq!(names, ["added", "removed"]);
    }
}
