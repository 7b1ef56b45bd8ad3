//! Listing browse command.

use campus_market_core::{CATEGORIES, Category, Product, ProductFilter};
use campus_market_storefront::error::Result;
use campus_market_storefront::state::Storefront;

/// Print listings matching the optional search text and category.
///
/// An unknown category prints the valid ones instead of an empty list.
#[allow(clippy::print_stdout)]
pub async fn list(
    storefront: &Storefront,
    search: Option<String>,
    category: Option<String>,
) -> Result<()> {
    if let Some(value) = category.as_deref()
        && Category::find(value).is_none()
    {
        println!("Unknown category '{value}'. Valid categories:");
        for category in CATEGORIES {
            println!("  {:<12} {}", category.value, category.label);
        }
        return Ok(());
    }

    let filter = ProductFilter {
        query: search,
        category,
    };
    let products = storefront.catalog().search(&filter).await?;
    tracing::debug!(count = products.len(), "Listings matched");

    if products.is_empty() {
        println!("No listings found.");
        return Ok(());
    }

    let cart = storefront.cart();
    cart.load().await;
    for product in &products {
        let in_cart = product.id.as_ref().is_some_and(|id| cart.is_in_cart(id));
        println!("{}", render(product, in_cart));
    }
    Ok(())
}

fn render(product: &Product, in_cart: bool) -> String {
    let id = product.id.as_ref().map_or("-", |id| id.as_str());
    let mut line = format!(
        "{id:<26} {:<40} {:>12}  {}",
        product.title,
        product.price.display(),
        product.category.as_deref().unwrap_or("other"),
    );
    if product.status.is_sold() {
        line.push_str("  [sold]");
    }
    if in_cart {
        line.push_str("  [in cart]");
    }
    line
}
