//! Product catalog client.
//!
//! Fetches listings from `GET /api/products` and caches them using `moka`.
//! The cart never trusts caller-supplied product data for anything but the
//! line projection, so this is where products are resolved by id.

use std::sync::Arc;
use std::time::Duration;

use campus_market_core::{Product, ProductFilter, ProductId, filter_products};
use moka::future::Cache;
use reqwest::Method;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::api::{ApiClient, ApiError};

const PRODUCTS_PATH: &str = "api/products";

/// Errors that can occur when fetching the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Marketplace API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Response was not valid JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
enum CacheKey {
    Products,
}

/// Client for the product listings endpoint.
///
/// Cheaply cloneable; clones share the cache.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    api: ApiClient,
    cache: Cache<CacheKey, Arc<[Product]>>,
}

impl CatalogClient {
    /// Create a catalog client whose listings stay cached for `ttl`.
    #[must_use]
    pub fn new(api: ApiClient, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(16).time_to_live(ttl).build();
        Self {
            inner: Arc::new(CatalogClientInner { api, cache }),
        }
    }

    /// All listings, in the order the API returned them.
    ///
    /// A body that is not a JSON array is treated as no listings. Entries that
    /// are not product objects are skipped.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the request fails or the body is not JSON.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Arc<[Product]>, CatalogError> {
        if let Some(products) = self.inner.cache.get(&CacheKey::Products).await {
            debug!(count = products.len(), "Catalog cache hit");
            return Ok(products);
        }

        let body = self
            .inner
            .api
            .send_text(self.inner.api.request(Method::GET, PRODUCTS_PATH))
            .await?;
        let products: Arc<[Product]> = parse_products(&body)?.into();
        debug!(count = products.len(), "Fetched catalog");

        self.inner
            .cache
            .insert(CacheKey::Products, Arc::clone(&products))
            .await;
        Ok(products)
    }

    /// Listings matching `filter`, sold listings last.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the catalog cannot be fetched.
    pub async fn search(&self, filter: &ProductFilter) -> Result<Vec<Product>, CatalogError> {
        let products = self.products().await?;
        Ok(filter_products(&products, filter)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Look up a listing by id. `5` and `"5"` find the same listing.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the catalog cannot be fetched.
    pub async fn find(&self, id: &ProductId) -> Result<Option<Product>, CatalogError> {
        let products = self.products().await?;
        Ok(products
            .iter()
            .find(|product| product.id.as_ref() == Some(id))
            .cloned())
    }

    /// Drop cached listings so the next call refetches.
    pub async fn invalidate(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}

fn parse_products(body: &str) -> Result<Vec<Product>, serde_json::Error> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let Value::Array(values) = serde_json::from_str::<Value>(body)? else {
        warn!("Catalog response is not an array, treating as empty");
        return Ok(Vec::new());
    };

    Ok(values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<Product>(value) {
            Ok(product) => Some(product),
            Err(e) => {
                warn!(error = %e, "Skipping malformed product");
                None
            }
        })
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_parse_products_lenient() {
        let products = parse_products(
            r#"[
                {"_id": "a1", "title": "Desk Lamp", "price": "250", "category": "dorm-items"},
                42,
                {"id": 7, "title": "Calculus", "price": null, "status": "sold"}
            ]"#,
        )
        .unwrap();

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].price.amount(), Decimal::from(250));
        assert_eq!(products[1].id, Some(ProductId::from("7")));
        assert!(products[1].status.is_sold());
    }

    #[test]
    fn test_parse_products_non_array() {
        assert!(parse_products(r#"{"error": "maintenance"}"#).unwrap().is_empty());
        assert!(parse_products("null").unwrap().is_empty());
        assert!(parse_products("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_products_invalid_json() {
        assert!(parse_products("<html>").is_err());
    }
}
