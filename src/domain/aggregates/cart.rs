//! Cart Aggregate

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;
use crate::domain::aggregates::product::Product;
use crate::domain::events::CartEvent;
use crate::domain::value_objects::{Money, MoneyError, Sku};

#[derive(Clone, Debug, Serialize)]
pub struct Cart {
    id: String,
    session_id: String,
    items: Vec<CartItem>,
    subtotal: Money,
    currency: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<CartEvent>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CartItem {
    pub product_id: String,
    /// Selected variant, or [`Product::line_variant_id`] for products sold
    /// without variants.
    pub variant_id: String,
    pub name: String,
    pub variant_name: Option<String>,
    pub sku: Option<Sku>,
    pub quantity: u32,
    pub unit_price: Money,
    /// Stock reported for the line the last time it was added to.
    pub stock_limit: u32,
}

impl CartItem {
    pub fn line_total(&self) -> Money { self.unit_price.multiply(self.quantity) }
    fn is(&self, product_id: &str, variant_id: &str) -> bool { self.product_id == product_id && self.variant_id == variant_id }
}

impl Cart {
    pub fn new(session_id: impl Into<String>, currency: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7().to_string(), session_id: session_id.into(),
            items: vec![], subtotal: Money::zero(currency), currency: currency.to_uppercase(),
            created_at: now, updated_at: now, events: vec![],
        }
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn session_id(&self) -> &str { &self.session_id }
    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn subtotal(&self) -> &Money { &self.subtotal }
    pub fn item_count(&self) -> usize { self.items.len() }
    pub fn unit_count(&self) -> u32 { self.items.iter().map(|i| i.quantity).sum() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    pub fn quantity_of(&self, product_id: &str, variant_id: &str) -> u32 {
        self.items.iter().find(|i| i.is(product_id, variant_id)).map_or(0, |i| i.quantity)
    }

    /// Adds `qty` units of `product` (optionally a specific variant).
    ///
    /// Every check runs before the cart is touched, so a rejected add leaves
    /// the cart exactly as it was.
    pub fn add_item(&mut self, product: &Product, variant_id: Option<&str>, qty: u32) -> Result<&CartItem, CartError> {
        if qty == 0 { return Err(CartError::InvalidQuantity); }

        let variant = match (product.has_variants(), variant_id) {
            (true, None) => return Err(CartError::VariantRequired),
            (true, Some(id)) => Some(product.variant(id).ok_or_else(|| CartError::VariantNotFound(id.to_string()))?),
            (false, _) => None,
        };

        let (line_id, unit_price, stock, variant_name, sku) = match variant {
            Some(v) => (v.id.clone(), v.price.clone(), v.stock.value(), Some(v.name.clone()), v.sku.clone().or_else(|| product.sku().cloned())),
            None => (product.line_variant_id().to_string(), product.price().clone(), product.stock().value(), None, product.sku().cloned()),
        };

        if stock == 0 { return Err(CartError::OutOfStock); }
        if unit_price.currency() != self.currency { return Err(CartError::Money(MoneyError::CurrencyMismatch)); }

        let prospective = self.quantity_of(product.id(), &line_id).saturating_add(qty);
        if prospective > stock { return Err(CartError::StockLimitExceeded { available: stock }); }

        let index = match self.items.iter().position(|i| i.is(product.id(), &line_id)) {
            Some(index) => {
                let existing = &mut self.items[index];
                existing.quantity = prospective;
                existing.unit_price = unit_price;
                existing.stock_limit = stock;
                index
            }
            None => {
                self.items.push(CartItem {
                    product_id: product.id().to_string(), variant_id: line_id.clone(),
                    name: product.name().to_string(), variant_name, sku,
                    quantity: qty, unit_price, stock_limit: stock,
                });
                self.items.len() - 1
            }
        };
        self.raise_event(CartEvent::ItemAdded {
            cart_id: self.id.clone(), product_id: product.id().to_string(), variant_id: line_id,
            quantity: qty, line_quantity: prospective,
        });
        self.recalculate();
        Ok(&self.items[index])
    }

    pub fn update_quantity(&mut self, product_id: &str, variant_id: &str, quantity: u32) -> Result<(), CartError> {
        let item = self.items.iter_mut().find(|i| i.is(product_id, variant_id)).ok_or(CartError::ItemNotFound)?;
        if quantity > item.stock_limit { return Err(CartError::StockLimitExceeded { available: item.stock_limit }); }
        if quantity == 0 {
            self.items.retain(|i| !i.is(product_id, variant_id));
            self.raise_event(CartEvent::ItemRemoved { cart_id: self.id.clone(), product_id: product_id.into(), variant_id: variant_id.into() });
        } else {
            item.quantity = quantity;
            self.raise_event(CartEvent::QuantityUpdated { cart_id: self.id.clone(), product_id: product_id.into(), variant_id: variant_id.into(), quantity });
        }
        self.recalculate();
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: &str, variant_id: &str) -> Result<(), CartError> {
        let before = self.items.len();
        self.items.retain(|i| !i.is(product_id, variant_id));
        if self.items.len() == before { return Err(CartError::ItemNotFound); }
        self.raise_event(CartEvent::ItemRemoved { cart_id: self.id.clone(), product_id: product_id.into(), variant_id: variant_id.into() });
        self.recalculate();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.raise_event(CartEvent::Cleared { cart_id: self.id.clone() });
        self.recalculate();
    }

    pub fn take_events(&mut self) -> Vec<CartEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: CartEvent) { self.events.push(e); }

    fn recalculate(&mut self) {
        self.subtotal = self.items.iter().fold(Money::zero(&self.currency), |acc, i| acc.add(&i.line_total()).unwrap_or(acc));
        self.updated_at = Utc::now();
    }
}

/// Reasons an add or update is refused. The messages are shown to shoppers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("Quantity must be at least 1")]
    InvalidQuantity,
    #[error("Select a variant before adding this product to the cart")]
    VariantRequired,
    #[error("Variant {0} does not belong to this product")]
    VariantNotFound(String),
    #[error("This product (or the selected variant) is out of stock")]
    OutOfStock,
    #[error("You can only have a total of {available} units of this product in the cart")]
    StockLimitExceeded { available: u32 },
    #[error("Item not found")]
    ItemNotFound,
    #[error(transparent)]
    Money(#[from] MoneyError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::product::Variant;
    use crate::domain::value_objects::Quantity;

    fn tee(stock: u32) -> Product {
        Product::new("P1", "Boxy Tee", Money::idr(199_000)).with_stock(stock)
    }

    fn hoodie() -> Product {
        Product::new("P2", "Hoodie", Money::idr(350_000)).with_stock(9).with_variants(vec![
            Variant { id: "V-M".into(), name: "M".into(), price: Money::idr(350_000), stock: Quantity::new(5), sku: None },
            Variant { id: "V-L".into(), name: "L".into(), price: Money::idr(375_000), stock: Quantity::new(0), sku: None },
        ])
    }

    #[test]
    fn test_cart_operations() {
        let mut cart = Cart::new("s1", "IDR");
        cart.add_item(&tee(10), None, 2).unwrap();
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.subtotal().amount(), 398_000);
        cart.add_item(&tee(10), None, 1).unwrap();
        assert_eq!(cart.items()[0].quantity, 3); // Merged
        assert_eq!(cart.items()[0].variant_id, "P1");
    }

    #[test]
    fn test_line_uses_product_variant_id() {
        let mut cart = Cart::new("s1", "IDR");
        let socks = Product::new("P9", "Socks", Money::idr(49_000)).with_stock(6).with_product_variant_id("901");
        cart.add_item(&socks, None, 2).unwrap();
        assert_eq!(cart.items()[0].variant_id, "901");
        assert_eq!(cart.quantity_of("P9", "901"), 2);
        assert_eq!(cart.add_item(&socks, None, 5).unwrap_err(), CartError::StockLimitExceeded { available: 6 });
        cart.remove_item("P9", "901").unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_rejected_when_exceeding_stock() {
        let mut cart = Cart::new("s1", "IDR");
        let product = hoodie();
        cart.add_item(&product, Some("V-M"), 3).unwrap();
        cart.take_events();

        let err = cart.add_item(&product, Some("V-M"), 3).unwrap_err();
        assert_eq!(err, CartError::StockLimitExceeded { available: 5 });
        assert_eq!(cart.quantity_of("P2", "V-M"), 3);
        assert!(cart.take_events().is_empty());

        let line = cart.add_item(&product, Some("V-M"), 2).unwrap();
        assert_eq!(line.quantity, 5);
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn test_variant_selection_required() {
        let mut cart = Cart::new("s1", "IDR");
        assert_eq!(cart.add_item(&hoodie(), None, 1).unwrap_err(), CartError::VariantRequired);
        assert_eq!(cart.add_item(&hoodie(), Some("V-XL"), 1).unwrap_err(), CartError::VariantNotFound("V-XL".into()));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_out_of_stock_rejected() {
        let mut cart = Cart::new("s1", "IDR");
        assert_eq!(cart.add_item(&tee(0), None, 1).unwrap_err(), CartError::OutOfStock);
        assert_eq!(cart.add_item(&hoodie(), Some("V-L"), 1).unwrap_err(), CartError::OutOfStock);
        assert_eq!(cart.add_item(&tee(3), None, 0).unwrap_err(), CartError::InvalidQuantity);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_variants_are_separate_lines() {
        let mut cart = Cart::new("s1", "IDR");
        let mut product = hoodie();
        product.replace_variants(vec![
            Variant { id: "V-M".into(), name: "M".into(), price: Money::idr(350_000), stock: Quantity::new(5), sku: None },
            Variant { id: "V-S".into(), name: "S".into(), price: Money::idr(340_000), stock: Quantity::new(5), sku: None },
        ]);
        cart.add_item(&product, Some("V-M"), 1).unwrap();
        cart.add_item(&product, Some("V-S"), 1).unwrap();
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.subtotal().amount(), 690_000);
        assert_eq!(cart.items()[1].variant_name.as_deref(), Some("S"));
    }

    #[test]
    fn test_currency_mismatch_rejected() {
        let mut cart = Cart::new("s1", "USD");
        assert_eq!(cart.add_item(&tee(3), None, 1).unwrap_err(), CartError::Money(MoneyError::CurrencyMismatch));
    }

    #[test]
    fn test_update_and_remove() {
        let mut cart = Cart::new("s1", "IDR");
        cart.add_item(&tee(4), None, 1).unwrap();
        assert_eq!(cart.update_quantity("P1", "P1", 5).unwrap_err(), CartError::StockLimitExceeded { available: 4 });
        cart.update_quantity("P1", "P1", 4).unwrap();
        assert_eq!(cart.unit_count(), 4);
        cart.update_quantity("P1", "P1", 0).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.remove_item("P1", "P1").unwrap_err(), CartError::ItemNotFound);

        cart.add_item(&tee(4), None, 2).unwrap();
        cart.remove_item("P1", "P1").unwrap();
        assert_eq!(cart.subtotal().amount(), 0);
        let names: Vec<_> = cart.take_events().iter().map(CartEvent::name).collect();
        assert_eq!(names, ["item_added", "quantity_updated", "item_removed", "item_added", "item_removed"]);
    }
}
