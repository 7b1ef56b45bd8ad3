//! Campus Market Core - Shared types library.
//!
//! This crate provides the types shared by every Campus Market component:
//! - `storefront` - Client runtime (session identity, cart store, catalog client)
//! - `cli` - Command-line driver for browsing products and managing a cart
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no storage
//! access, no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Identifiers, prices, products, cart lines and snapshots
//! - [`catalog`] - Product search and category filtering
//! - [`contact`] - Seller contact link construction

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod contact;
pub mod types;

pub use catalog::{CATEGORIES, Category, ProductFilter, filter_products};
pub use contact::ContactAction;
pub use types::*;
