//! Storefront domain model
pub mod aggregates;
pub mod catalog;
pub mod events;
pub mod value_objects;
