//! Raw backend payloads and their normalization into domain records.
//!
//! The catalogue API is loosely typed: numbers arrive as strings, the compare
//! price and category go by several names, and images live either in `image`
//! or in a `media` list. All of that is absorbed here.

use chrono::{DateTime, Utc};
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::domain::aggregates::{Product, Variant};
use crate::domain::value_objects::{Money, Quantity, Sku};

/// `{ code, message, data }` wrapper used by every endpoint.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    pub data: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub current_page: u32,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    pub last_page: u32,
    pub total: u64,
    pub per_page: u32,
}

impl<T> Paginated<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> Option<U>) -> Paginated<U> {
        Paginated {
            current_page: self.current_page, data: self.data.into_iter().filter_map(f).collect(),
            last_page: self.last_page, total: self.total, per_page: self.per_page,
        }
    }
}

/// A JSON scalar that should be a number but may be sent as text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Numeric {
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Self::Int(v) => *v as f64,
            Self::Float(v) => *v,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    /// Non-negative whole amount; negatives clamp to zero.
    pub fn as_amount(&self) -> Option<u64> {
        self.as_f64().map(|v| if v <= 0.0 { 0 } else { v.round() as u64 })
    }

    pub fn as_id(&self) -> Option<String> {
        match self {
            Self::Int(v) => Some(v.to_string()),
            Self::Float(v) if v.fract() == 0.0 => Some((*v as i64).to_string()),
            Self::Float(v) => Some(v.to_string()),
            Self::Text(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Self::Text(_) => None,
        }
    }
}

fn amount(value: &Option<Numeric>) -> u64 { value.as_ref().and_then(Numeric::as_amount).unwrap_or(0) }
fn count(value: &Option<Numeric>) -> Option<u32> {
    value.as_ref().and_then(Numeric::as_amount).map(|v| u32::try_from(v).unwrap_or(u32::MAX))
}

/// Reads a field as `T`, or `None` when its shape is unexpected. One odd
/// field never fails the record it sits in.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

fn first_text<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates.into_iter().flatten().map(|s| s.trim().to_string()).find(|s| !s.is_empty())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMedia {
    #[serde(default, deserialize_with = "lenient")]
    pub original_url: Option<String>,
}

/// Tags come as plain strings or as `{ id, name }` objects.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawTag {
    Text(String),
    Named { name: String },
}

impl RawTag {
    fn into_name(self) -> String {
        match self {
            Self::Text(name) | Self::Named { name } => name,
        }
    }
}

/// `reviews` is either a count or the review relation itself.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawReviews {
    Count(Numeric),
    List(Vec<Value>),
}

impl RawReviews {
    fn count(&self) -> Option<u32> {
        match self {
            Self::Count(n) => n.as_amount().map(|v| u32::try_from(v).unwrap_or(u32::MAX)),
            Self::List(list) => Some(u32::try_from(list.len()).unwrap_or(u32::MAX)),
        }
    }
}

/// One catalogue record as sent by the backend. Every alternative name has
/// its own field; `normalize` picks the first usable one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProduct {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<Numeric>,
    #[serde(default, deserialize_with = "lenient")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub category_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub price: Option<Numeric>,
    #[serde(default, deserialize_with = "lenient")]
    pub compare_at_price: Option<Numeric>,
    #[serde(default, deserialize_with = "lenient")]
    pub was: Option<Numeric>,
    #[serde(default, deserialize_with = "lenient")]
    pub original_price: Option<Numeric>,
    #[serde(default, deserialize_with = "lenient")]
    pub stock: Option<Numeric>,
    #[serde(default, deserialize_with = "lenient")]
    pub rating: Option<Numeric>,
    #[serde(default, deserialize_with = "lenient")]
    pub review_count: Option<Numeric>,
    #[serde(default, deserialize_with = "lenient")]
    pub total_reviews: Option<Numeric>,
    #[serde(default, deserialize_with = "lenient")]
    pub reviews: Option<RawReviews>,
    #[serde(default, deserialize_with = "lenient")]
    pub sales: Option<Numeric>,
    #[serde(default, deserialize_with = "lenient")]
    pub tags: Option<Vec<RawTag>>,
    #[serde(default)]
    pub featured: Option<Value>,
    #[serde(default)]
    pub is_featured: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub sku: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub media: Option<Vec<RawMedia>>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub product_variant_id: Option<Numeric>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawVariant {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<Numeric>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<Numeric>,
    #[serde(default, deserialize_with = "lenient")]
    pub price: Option<Numeric>,
    #[serde(default, deserialize_with = "lenient")]
    pub stock: Option<Numeric>,
    #[serde(default, deserialize_with = "lenient")]
    pub sku: Option<String>,
}

/// The variants endpoint answers with either a bare list or `{ data: [...] }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum VariantList {
    Bare(Vec<Value>),
    Wrapped { data: Vec<Value> },
}

impl VariantList {
    pub fn into_vec(self) -> Vec<RawVariant> {
        match self {
            Self::Bare(list) | Self::Wrapped { data: list } => list.into_iter().filter_map(|v| serde_json::from_value(v).ok()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCategory {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<Numeric>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub media: Option<Vec<RawMedia>>,
}

fn first_image(image: Option<String>, media: Option<Vec<RawMedia>>) -> Option<String> {
    image
        .filter(|s| !s.trim().is_empty())
        .or_else(|| media?.into_iter().find_map(|m| m.original_url.filter(|u| !u.trim().is_empty())))
}

// Accepts true/false, 1/0 and "1"/"true".
fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"),
        _ => false,
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").ok().map(|at| at.and_utc())
}

impl RawProduct {
    /// Builds the strict record, or `None` when the payload lacks an id or
    /// a name.
    pub fn normalize(self, currency: &str) -> Option<Product> {
        let id = self.id.as_ref().and_then(Numeric::as_id)?;
        let name = first_text([self.name])?;
        let slug = first_text([self.slug]).unwrap_or_else(|| id.clone());

        let tags: Vec<String> = self.tags.unwrap_or_default().into_iter().map(RawTag::into_name).filter(|t| !t.trim().is_empty()).collect();
        let mut product = Product::new(id, name, Money::new(amount(&self.price), currency))
            .with_slug(slug)
            .with_category(first_text([self.category, self.category_name]).unwrap_or_default())
            .with_stock(count(&self.stock).unwrap_or(0))
            .with_tags(tags)
            .with_featured(truthy(self.featured.as_ref()) || truthy(self.is_featured.as_ref()));

        let was = [&self.compare_at_price, &self.was, &self.original_price]
            .into_iter()
            .find_map(|v| v.as_ref().and_then(Numeric::as_amount).filter(|a| *a > 0));
        if let Some(was) = was {
            product = product.with_compare_at_price(Money::new(was, currency));
        }
        if let Some(rating) = self.rating.as_ref().and_then(Numeric::as_f64) {
            product = product.with_rating(rating as f32);
        }
        let reviews = count(&self.review_count)
            .or_else(|| count(&self.total_reviews))
            .or_else(|| self.reviews.as_ref().and_then(RawReviews::count));
        if let Some(reviews) = reviews { product = product.with_review_count(reviews); }
        if let Some(sales) = count(&self.sales) { product = product.with_sales(sales); }
        if let Some(line) = self.product_variant_id.as_ref().and_then(Numeric::as_id) { product = product.with_product_variant_id(line); }
        if let Some(sku) = self.sku.and_then(|s| Sku::new(s).ok()) { product = product.with_sku(sku); }
        if let Some(url) = first_image(self.image, self.media) { product = product.with_image_url(url); }
        if let Some(description) = first_text([self.description]) { product = product.with_description(description); }
        if let Some(at) = self.created_at.as_deref().and_then(parse_timestamp) { product = product.with_created_at(at); }
        Some(product)
    }
}

/// Normalizes a listing page record by record. Records that are not objects
/// or lack an id or name are dropped; the rest of the page survives.
pub fn products_from_page(page: Paginated<Value>, currency: &str) -> Paginated<Product> {
    page.map(|value| serde_json::from_value::<RawProduct>(value).ok()?.normalize(currency))
}

impl RawVariant {
    pub fn normalize(self, currency: &str) -> Option<Variant> {
        let id = self.id.as_ref().and_then(Numeric::as_id)?;
        let name = self.name.as_ref().and_then(Numeric::as_id).unwrap_or_else(|| id.clone());
        Some(Variant {
            id, name,
            price: Money::new(amount(&self.price), currency),
            stock: Quantity::new(count(&self.stock).unwrap_or(0)),
            sku: self.sku.and_then(|s| Sku::new(s).ok()),
        })
    }
}

impl RawCategory {
    pub fn normalize(self) -> Option<Category> {
        let id = self.id.as_ref().and_then(Numeric::as_id)?;
        let name = first_text([self.name])?;
        let slug = first_text([self.slug]).unwrap_or_else(|| name.to_lowercase().replace(' ', "-"));
        Some(Category { id, name, slug, image_url: first_image(self.image, self.media) })
    }
}

pub fn categories_from_page(page: Paginated<Value>) -> Paginated<Category> {
    page.map(|value| serde_json::from_value::<RawCategory>(value).ok()?.normalize())
}
