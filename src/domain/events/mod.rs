//! Domain events
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CartEvent {
    ItemAdded { cart_id: String, product_id: String, variant_id: String, quantity: u32, line_quantity: u32 },
    QuantityUpdated { cart_id: String, product_id: String, variant_id: String, quantity: u32 },
    ItemRemoved { cart_id: String, product_id: String, variant_id: String },
    Cleared { cart_id: String },
}

impl CartEvent {
    pub fn cart_id(&self) -> &str {
        match self {
            Self::ItemAdded { cart_id, .. }
            | Self::QuantityUpdated { cart_id, .. }
            | Self::ItemRemoved { cart_id, .. }
            | Self::Cleared { cart_id } => cart_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ItemAdded { .. } => "item_added",
            Self::QuantityUpdated { .. } => "quantity_updated",
            Self::ItemRemoved { .. } => "item_removed",
            Self::Cleared { .. } => "cleared",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WishlistEvent {
    Added { product_id: String },
    Removed { product_id: String },
}

impl WishlistEvent {
    pub fn product_id(&self) -> &str {
        match self {
            Self::Added { product_id } | Self::Removed { product_id } => product_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Added { .. } => "added",
            Self::Removed { .. } => "removed",
        }
    }
}
