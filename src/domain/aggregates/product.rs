//! Product Aggregate
//!
//! Read-only projection of a catalogue record. Instances are produced by the
//! backend normalization step; the view engine and the cart only read them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use crate::domain::value_objects::{Money, Quantity, Sku};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    id: String,
    slug: String,
    name: String,
    category: String,
    price: Money,
    compare_at_price: Option<Money>,
    stock: Quantity,
    rating: Option<f32>,
    review_count: Option<u32>,
    sales: Option<u32>,
    tags: Vec<String>,
    featured: bool,
    sku: Option<Sku>,
    image_url: Option<String>,
    description: Option<String>,
    variants: Vec<Variant>,
    product_variant_id: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant { pub id: String, pub name: String, pub price: Money, pub stock: Quantity, pub sku: Option<Sku> }

impl Product {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Money) -> Self {
        let id = id.into();
        Self {
            slug: id.clone(), id, name: name.into(), category: String::new(),
            price, compare_at_price: None, stock: Quantity::default(), rating: None,
            review_count: None, sales: None, tags: vec![], featured: false, sku: None,
            image_url: None, description: None, variants: vec![], product_variant_id: None, created_at: None,
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self { self.slug = slug.into(); self }
    pub fn with_category(mut self, category: impl Into<String>) -> Self { self.category = category.into(); self }
    pub fn with_compare_at_price(mut self, was: Money) -> Self { self.compare_at_price = Some(was); self }
    pub fn with_stock(mut self, stock: u32) -> Self { self.stock = Quantity::new(stock); self }
    pub fn with_rating(mut self, rating: f32) -> Self { self.rating = Some(rating.clamp(0.0, 5.0)); self }
    pub fn with_review_count(mut self, reviews: u32) -> Self { self.review_count = Some(reviews); self }
    pub fn with_sales(mut self, sales: u32) -> Self { self.sales = Some(sales); self }
    pub fn with_tags<I, S>(mut self, tags: I) -> Self where I: IntoIterator<Item = S>, S: Into<String> {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
    pub fn with_featured(mut self, featured: bool) -> Self { self.featured = featured; self }
    pub fn with_sku(mut self, sku: Sku) -> Self { self.sku = Some(sku); self }
    pub fn with_image_url(mut self, url: impl Into<String>) -> Self { self.image_url = Some(url.into()); self }
    pub fn with_description(mut self, description: impl Into<String>) -> Self { self.description = Some(description.into()); self }
    pub fn with_variants(mut self, variants: Vec<Variant>) -> Self { self.variants = variants; self }
    pub fn with_product_variant_id(mut self, id: impl Into<String>) -> Self { self.product_variant_id = Some(id.into()); self }
    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self { self.created_at = Some(at); self }

    pub fn id(&self) -> &str { &self.id }
    pub fn slug(&self) -> &str { &self.slug }
    pub fn name(&self) -> &str { &self.name }
    pub fn category(&self) -> &str { &self.category }
    pub fn price(&self) -> &Money { &self.price }
    pub fn compare_at_price(&self) -> Option<&Money> { self.compare_at_price.as_ref() }
    pub fn stock(&self) -> Quantity { self.stock }
    pub fn rating(&self) -> Option<f32> { self.rating }
    pub fn review_count(&self) -> u32 { self.review_count.unwrap_or(0) }
    pub fn sales(&self) -> Option<u32> { self.sales }
    pub fn tags(&self) -> &[String] { &self.tags }
    pub fn is_featured(&self) -> bool { self.featured }
    pub fn sku(&self) -> Option<&Sku> { self.sku.as_ref() }
    pub fn image_url(&self) -> Option<&str> { self.image_url.as_deref() }
    pub fn description(&self) -> Option<&str> { self.description.as_deref() }
    pub fn variants(&self) -> &[Variant] { &self.variants }
    pub fn created_at(&self) -> Option<DateTime<Utc>> { self.created_at }
    pub fn is_in_stock(&self) -> bool { !self.stock.is_zero() }
    pub fn has_variants(&self) -> bool { !self.variants.is_empty() }

    /// Cart line id when no variant is selected: the record's own variant id
    /// if the backend sent one, else the product id.
    pub fn line_variant_id(&self) -> &str { self.product_variant_id.as_deref().unwrap_or(&self.id) }

    pub fn variant(&self, id: &str) -> Option<&Variant> { self.variants.iter().find(|v| v.id == id) }

    /// Attaches variants fetched separately from the product record.
    pub fn replace_variants(&mut self, variants: Vec<Variant>) { self.variants = variants; }

    /// `(compare_at - price, compare_at)` when a real discount exists.
    fn discount_parts(&self) -> Option<(u64, u64)> {
        let was = self.compare_at_price.as_ref()?.amount();
        let now = self.price.amount();
        (was > now).then(|| (was - now, was))
    }

    pub fn is_discounted(&self) -> bool { self.discount_parts().is_some() }

    /// Whole-percent discount shown on sale badges.
    pub fn discount_percent(&self) -> u32 {
        match self.discount_parts() {
            Some((off, was)) => ((off as f64 / was as f64) * 100.0).round() as u32,
            None => 0,
        }
    }

    /// Orders two products by discount fraction, exactly.
    pub fn cmp_discount(&self, other: &Product) -> Ordering {
        let (a_off, a_was) = self.discount_parts().unwrap_or((0, 1));
        let (b_off, b_was) = other.discount_parts().unwrap_or((0, 1));
        (u128::from(a_off) * u128::from(b_was)).cmp(&(u128::from(b_off) * u128::from(a_was)))
    }

    /// Identifier read as a number; used as the recency fallback for
    /// records the backend sends without a timestamp.
    pub fn numeric_id(&self) -> Option<u64> { self.id.trim().parse().ok() }

    pub fn matches_text(&self, needle_lower: &str) -> bool {
        self.name.to_lowercase().contains(needle_lower)
            || self.tags.iter().any(|t| t.to_lowercase().contains(needle_lower))
    }
}
