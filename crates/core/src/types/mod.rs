//! Core types for Campus Market.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod id;
pub mod price;
pub mod product;
pub mod status;

pub use cart::{CartLine, CartSnapshot};
pub use id::{ProductId, SessionId, canonical_id};
pub use price::Price;
pub use product::Product;
pub use status::ProductStatus;
