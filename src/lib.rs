//! Storefront catalogue service
//!
//! Server side of a fashion storefront sitting in front of a remote
//! catalogue REST API.
//!
//! ## Features
//! - Catalogue listings: filter, sort and paginate a fetched page of products
//! - Best-seller and product detail views
//! - Shopping cart with stock-aware quantity reconciliation
//! - Cart and wishlist change subscriptions
//! - Home page sections and the promotional campaign countdown

pub mod api;
pub mod backend;
pub mod config;
pub mod domain;
pub mod services;

use thiserror::Error;

use crate::backend::BackendError;
use crate::domain::aggregates::{CartError, WishlistError};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorefrontError {
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Cart not found")]
    CartNotFound,

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Wishlist(#[from] WishlistError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
