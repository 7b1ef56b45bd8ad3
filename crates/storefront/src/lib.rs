//! Campus Market storefront runtime.
//!
//! Client-side cart and session handling for the marketplace: durable
//! storage, the anonymous session id, pluggable cart backends, the cart store
//! that keeps them consistent, and the product catalog client.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod backend;
pub mod catalog;
pub mod config;
pub mod error;
pub mod notify;
pub mod session;
pub mod state;
pub mod storage;
pub mod store;
