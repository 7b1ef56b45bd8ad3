//! Catalog product records.
//!
//! Records come from `GET /api/products` (and are echoed back by the cart
//! endpoints). Field names follow the marketplace backend's camelCase JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::id::{ProductId, canonical_id};
use super::price::Price;
use super::status::ProductStatus;

/// A product listing as published by the catalog.
///
/// The identifier is optional because catalog data is not validated at this
/// boundary; a product without one cannot enter a cart.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "RawProduct", rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ProductId>,
    pub title: String,
    pub description: String,
    pub price: Price,
    pub category: Option<String>,
    pub condition: Option<String>,
    pub seller_name: String,
    pub contact_method: Option<String>,
    pub contact_details: Option<String>,
    pub images: Vec<String>,
    pub status: ProductStatus,
}

impl Product {
    /// First image reference, if any.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// Wire shape accepted from any catalog or cart endpoint.
///
/// Identifiers may arrive under `_id` or `id`, as strings or numbers.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProduct {
    #[serde(rename = "_id", default)]
    underscore_id: Value,
    #[serde(default)]
    id: Value,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    price: Price,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    condition: Option<String>,
    #[serde(default)]
    seller_name: Option<String>,
    #[serde(default)]
    contact_method: Option<String>,
    #[serde(default)]
    contact_details: Option<String>,
    #[serde(default)]
    images: Option<Vec<String>>,
    #[serde(default)]
    status: Value,
}

impl From<RawProduct> for Product {
    fn from(raw: RawProduct) -> Self {
        Self {
            id: canonical_id(&raw.underscore_id).or_else(|| canonical_id(&raw.id)),
            title: raw.title.unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
            price: raw.price,
            category: raw.category,
            condition: raw.condition,
            seller_name: raw.seller_name.unwrap_or_default(),
            contact_method: raw.contact_method,
            contact_details: raw.contact_details.filter(|d| !d.is_empty()),
            images: raw.images.unwrap_or_default(),
            status: serde_json::from_value(raw.status).unwrap_or_default(),
        }
    }
}
