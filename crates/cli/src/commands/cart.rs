//! Cart commands.
//!
//! Failures inside the cart store are reported through the notifier and
//! leave the cart as it was, so these commands print whatever the store holds
//! afterwards.

use campus_market_core::CartSnapshot;
use campus_market_storefront::error::Result;
use campus_market_storefront::state::Storefront;

/// Print the cart.
pub async fn show(storefront: &Storefront) {
    let snapshot = storefront.load_cart().await;
    print_snapshot(&snapshot);
}

/// Add a listing, resolving it through the catalog first.
pub async fn add(storefront: &Storefront, id: String) -> Result<()> {
    let snapshot = storefront.add_product_by_id(id).await?;
    print_snapshot(&snapshot);
    Ok(())
}

/// Remove a listing from the cart.
pub async fn remove(storefront: &Storefront, id: String) {
    let snapshot = storefront.cart().remove_item(id).await;
    print_snapshot(&snapshot);
}

/// Empty the cart.
pub async fn clear(storefront: &Storefront) {
    let snapshot = storefront.cart().clear_cart().await;
    print_snapshot(&snapshot);
}

#[allow(clippy::print_stdout)]
fn print_snapshot(snapshot: &CartSnapshot) {
    print!("{}", render(snapshot));
}

fn render(snapshot: &CartSnapshot) -> String {
    if snapshot.is_empty() {
        return "Your cart is empty.\n".to_string();
    }

    let mut out = String::new();
    for line in snapshot.lines() {
        out.push_str(&format!(
            "{:<26} {:<40} {:>12}  {}\n",
            line.id,
            line.title,
            line.price.display(),
            line.seller_name,
        ));
    }
    let noun = if snapshot.len() == 1 { "item" } else { "items" };
    out.push_str(&format!(
        "{} {noun}, total {}\n",
        snapshot.len(),
        snapshot.total().display()
    ));
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use campus_market_core::CartLine;

    use super::*;

    fn line(json: &str) -> CartLine {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render(&CartSnapshot::empty()), "Your cart is empty.\n");
    }

    #[test]
    fn test_render_total() {
        let snapshot = CartSnapshot::from_lines([
            line(r#"{"_id": "a", "title": "Lamp", "price": 10, "sellerName": "Asha"}"#),
            line(r#"{"_id": "b", "title": "Notes", "price": "20"}"#),
            line(r#"{"_id": "c", "title": "Free mug", "price": null}"#),
        ]);
        let out = render(&snapshot);
        assert_eq!(out.lines().count(), 4);
        assert!(out.ends_with("3 items, total ₹30.00\n"));
    }
}
