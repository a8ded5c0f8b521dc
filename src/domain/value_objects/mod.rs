//! Value Objects for the storefront

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// SKU (Stock Keeping Unit) value object
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sku(String);

impl Sku {
    pub fn new(value: impl Into<String>) -> Result<Self, SkuError> {
        let value = value.into().trim().to_uppercase();
        if value.is_empty() { return Err(SkuError::Empty); }
        if value.len() > 50 { return Err(SkuError::TooLong); }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl TryFrom<String> for Sku {
    type Error = SkuError;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<Sku> for String {
    fn from(sku: Sku) -> Self { sku.0 }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkuError {
    #[error("SKU empty")]
    Empty,
    #[error("SKU too long")]
    TooLong,
}

/// Money value object. Amounts are integer minor units of `currency`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money { amount: u64, currency: String }

impl Money {
    pub fn new(amount: u64, currency: &str) -> Self { Self { amount, currency: currency.to_uppercase() } }
    pub fn idr(amount: u64) -> Self { Self::new(amount, "IDR") }
    pub fn zero(currency: &str) -> Self { Self::new(0, currency) }
    pub fn amount(&self) -> u64 { self.amount }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency { return Err(MoneyError::CurrencyMismatch); }
        Ok(Money::new(self.amount.saturating_add(other.amount), &self.currency))
    }
    pub fn multiply(&self, qty: u32) -> Money { Money::new(self.amount.saturating_mul(u64::from(qty)), &self.currency) }
}

impl Default for Money { fn default() -> Self { Self::zero("IDR") } }

/// Renders rupiah the way the storefront labels prices (`Rp 199.000`);
/// other currencies fall back to `<amount> <code>`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.currency == "IDR" {
            return write!(f, "Rp {}", group_thousands(self.amount, '.'));
        }
        write!(f, "{} {}", group_thousands(self.amount, ','), self.currency)
    }
}

fn group_thousands(value: u64, separator: char) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 { out.push(separator); }
        out.push(ch);
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("Currency mismatch")]
    CurrencyMismatch,
}

/// Quantity value object
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: u32) -> Self { Self(value) }
    pub fn value(&self) -> u32 { self.0 }
    pub fn add(&self, other: u32) -> Self { Self(self.0.saturating_add(other)) }
    pub fn subtract(&self, other: u32) -> Option<Self> {
        if other > self.0 { None } else { Some(Self(self.0 - other)) }
    }
    pub fn is_zero(&self) -> bool { self.0 == 0 }
}

impl From<u32> for Quantity {
    fn from(value: u32) -> Self { Self(value) }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_sku() { let sku = Sku::new(" bbx-bs-1000 ").unwrap(); assert_eq!(sku.as_str(), "BBX-BS-1000"); }
    #[test]
    fn test_sku_rejects_blank() { assert_eq!(Sku::new("   "), Err(SkuError::Empty)); }
    #[test]
    fn test_money_add() {
        let a = Money::idr(100_000);
        let b = Money::idr(50_000);
        assert_eq!(a.add(&b).unwrap().amount(), 150_000);
        assert_eq!(a.add(&Money::new(1, "usd")), Err(MoneyError::CurrencyMismatch));
    }
    #[test]
    fn test_money_display() {
        assert_eq!(Money::idr(199_000).to_string(), "Rp 199.000");
        assert_eq!(Money::idr(1_250_000).to_string(), "Rp 1.250.000");
        assert_eq!(Money::idr(0).to_string(), "Rp 0");
        assert_eq!(Money::new(123456, "usd").to_string(), "123,456 USD");
    }
    #[test]
    fn test_quantity_subtract() {
        let q = Quantity::new(3);
        assert_eq!(q.subtract(2), Some(Quantity::new(1)));
        assert_eq!(q.subtract(4), None);
        assert!(Quantity::default().is_zero());
    }
}
