//! Application services
pub mod campaign;
pub mod cart;
pub mod catalog;
pub mod wishlist;

pub use campaign::{Campaign, CampaignService, CampaignSnapshot, Countdown, CountdownTicker};
pub use cart::{CartNotification, CartService};
pub use catalog::{CatalogService, HomeSections, ProductDetail, SaleItem};
pub use wishlist::{WishlistNotification, WishlistService};
