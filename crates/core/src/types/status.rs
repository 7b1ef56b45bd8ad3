//! Listing status.

use serde::{Deserialize, Serialize};

/// Availability of a catalog listing.
///
/// Only `"sold"` is meaningful to the client; any other or missing value is
/// treated as available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Sold,
    // Catch-all must stay the last variant
    #[default]
    #[serde(other)]
    Available,
}

impl ProductStatus {
    /// Whether the listing has been marked as sold.
    #[must_use]
    pub const fn is_sold(self) -> bool {
        matches!(self, Self::Sold)
    }
}
