//! Catalogue view engine
//!
//! Pure transformation of an already-fetched product list into the page a
//! listing shows. Nothing here performs I/O or keeps state between calls.

pub mod filter;
pub mod view;

pub use filter::{FilterState, PriceBand, SortKey, DEFAULT_PAGE_SIZE};
pub use view::{compute_view, sort_products, ViewResult};
