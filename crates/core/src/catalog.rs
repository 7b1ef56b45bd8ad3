//! Product search and category filtering.

use crate::types::Product;

/// A browsable product category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    /// Value stored on listings (e.g., `dorm-items`).
    pub value: &'static str,
    /// Human-readable label.
    pub label: &'static str,
}

/// Value that disables category filtering.
pub const ALL_CATEGORIES: &str = "all";

/// Categories offered when browsing, in display order.
pub const CATEGORIES: &[Category] = &[
    Category { value: ALL_CATEGORIES, label: "All Categories" },
    Category { value: "textbooks", label: "Textbooks" },
    Category { value: "electronics", label: "Electronics" },
    Category { value: "dorm-items", label: "Dorm Items" },
    Category { value: "supplies", label: "Supplies" },
    Category { value: "clothing", label: "Clothing" },
    Category { value: "furniture", label: "Furniture" },
    Category { value: "other", label: "Other" },
];

impl Category {
    /// Find a category by value (case-insensitive).
    #[must_use]
    pub fn find(value: &str) -> Option<&'static Self> {
        CATEGORIES
            .iter()
            .find(|c| c.value.eq_ignore_ascii_case(value))
    }
}

/// Search query and category selection applied to a product listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Case-insensitive substring matched against title and description.
    pub query: Option<String>,
    /// Category value; `None` or `"all"` matches every category.
    pub category: Option<String>,
}

impl ProductFilter {
    /// Whether a single product passes the filter.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        self.matches_query(product) && self.matches_category(product)
    }

    fn matches_query(&self, product: &Product) -> bool {
        let Some(query) = self.query.as_deref().filter(|q| !q.is_empty()) else {
            return true;
        };
        let needle = query.to_lowercase();
        product.title.to_lowercase().contains(&needle)
            || product.description.to_lowercase().contains(&needle)
    }

    fn matches_category(&self, product: &Product) -> bool {
        match self.category.as_deref() {
            None => true,
            Some(wanted) if wanted.eq_ignore_ascii_case(ALL_CATEGORIES) => true,
            Some(wanted) => product
                .category
                .as_deref()
                .is_some_and(|c| c.to_lowercase() == wanted.to_lowercase()),
        }
    }
}

/// Filter products and move sold listings after available ones.
///
/// Relative order within the available and sold groups is preserved.
#[must_use]
pub fn filter_products<'a>(products: &'a [Product], filter: &ProductFilter) -> Vec<&'a Product> {
    let mut matching: Vec<&Product> = products.iter().filter(|p| filter.matches(p)).collect();
    matching.sort_by_key(|p| p.status.is_sold());
    matching
}
