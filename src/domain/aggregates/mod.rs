//! Aggregates module
pub mod product;
pub mod cart;
pub mod wishlist;

pub use product::{Product, Variant};
pub use cart::{Cart, CartError, CartItem};
pub use wishlist::{Wishlist, WishlistError, WishlistItem};
