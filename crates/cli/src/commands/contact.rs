//! Seller contact command.

use campus_market_core::{ContactAction, ProductId};
use campus_market_storefront::error::{AppError, Result};
use campus_market_storefront::state::Storefront;

/// Print how to reach the seller of a listing.
///
/// Looks in the catalog first and falls back to the cart, so sellers of
/// listings that have since left the catalog can still be reached.
#[allow(clippy::print_stdout)]
pub async fn show(storefront: &Storefront, id: String) -> Result<()> {
    let id = ProductId::from(id);

    let action = match storefront.catalog().find(&id).await? {
        Some(product) => ContactAction::for_product(&product),
        None => {
            storefront.load_cart().await;
            let line = storefront
                .cart()
                .snapshot()
                .get(&id)
                .cloned()
                .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
            ContactAction::for_line(&line)
        }
    };

    match action {
        ContactAction::Open(url) => println!("Open: {url}"),
        ContactAction::Show(message) | ContactAction::Unavailable(message) => {
            println!("{message}");
        }
    }
    Ok(())
}
