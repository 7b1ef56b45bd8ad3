//! Cart lines and snapshots.
//!
//! A cart holds at most one unit of any product, so a line is a product
//! projection with an implicit quantity of 1. Snapshots are immutable values;
//! every change builds a new one and recomputes the total from scratch.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::ProductId;
use super::price::Price;
use super::product::Product;

/// Returned when a product without an identifier is turned into a cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("product has no identifier")]
pub struct MissingProductId;

/// One product's presence in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Product", rename_all = "camelCase")]
pub struct CartLine {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    pub category: Option<String>,
    pub condition: Option<String>,
    pub images: Vec<String>,
    pub seller_name: String,
    pub contact_method: Option<String>,
    pub contact_details: Option<String>,
}

impl CartLine {
    /// Project a product into a cart line.
    ///
    /// # Errors
    ///
    /// Returns [`MissingProductId`] if the product has no identifier.
    pub fn from_product(product: &Product) -> Result<Self, MissingProductId> {
        Self::try_from(product.clone())
    }
}

impl TryFrom<Product> for CartLine {
    type Error = MissingProductId;

    fn try_from(product: Product) -> Result<Self, Self::Error> {
        let id = product
            .id
            .filter(|id| !id.is_empty())
            .ok_or(MissingProductId)?;
        Ok(Self {
            id,
            title: product.title,
            price: product.price,
            category: product.category,
            condition: product.condition,
            images: product.images,
            seller_name: product.seller_name,
            contact_method: product.contact_method,
            contact_details: product.contact_details,
        })
    }
}

/// The ordered set of cart lines plus their derived total.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CartSnapshot {
    items: Vec<CartLine>,
    total: Price,
}

impl CartSnapshot {
    /// An empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from lines in order.
    ///
    /// Later lines repeating an identifier already seen are dropped.
    #[must_use]
    pub fn from_lines(lines: impl IntoIterator<Item = CartLine>) -> Self {
        let mut seen = HashSet::new();
        let items: Vec<CartLine> = lines
            .into_iter()
            .filter(|line| seen.insert(line.id.clone()))
            .collect();
        let total = Price::sum(items.iter().map(|line| &line.price));
        Self { items, total }
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.items
    }

    /// Take the lines out of the snapshot.
    #[must_use]
    pub fn into_lines(self) -> Vec<CartLine> {
        self.items
    }

    /// Sum of line prices.
    #[must_use]
    pub const fn total(&self) -> Price {
        self.total
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether a line with this identifier is present.
    #[must_use]
    pub fn contains(&self, id: &ProductId) -> bool {
        self.get(id).is_some()
    }

    /// Look up a line by identifier.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&CartLine> {
        self.items.iter().find(|line| &line.id == id)
    }

    /// Append a line unless its identifier is already present.
    #[must_use]
    pub fn with_line(&self, line: CartLine) -> Self {
        if self.contains(&line.id) {
            return self.clone();
        }
        Self::from_lines(self.items.iter().cloned().chain(std::iter::once(line)))
    }

    /// Drop the line with this identifier, if any.
    #[must_use]
    pub fn without(&self, id: &ProductId) -> Self {
        Self::from_lines(self.items.iter().filter(|line| &line.id != id).cloned())
    }
}

impl FromIterator<CartLine> for CartSnapshot {
    fn from_iter<I: IntoIterator<Item = CartLine>>(iter: I) -> Self {
        Self::from_lines(iter)
    }
}
