//! Seller contact link construction.
//!
//! Listings carry a free-form contact method and details. Known messaging
//! methods become links; everything else is shown to the buyer verbatim.

use crate::types::{CartLine, Product};

/// What the client should do when the buyer asks to contact a seller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactAction {
    /// Open this URL (mail client, `WhatsApp`, Telegram).
    Open(String),
    /// Show this message; there is no link to follow.
    Show(String),
    /// The listing has no contact details.
    Unavailable(String),
}

impl ContactAction {
    /// Resolve the contact action for a catalog product.
    #[must_use]
    pub fn for_product(product: &Product) -> Self {
        Self::resolve(
            &product.seller_name,
            product.contact_method.as_deref(),
            product.contact_details.as_deref(),
        )
    }

    /// Resolve the contact action for a cart line.
    #[must_use]
    pub fn for_line(line: &CartLine) -> Self {
        Self::resolve(
            &line.seller_name,
            line.contact_method.as_deref(),
            line.contact_details.as_deref(),
        )
    }

    /// Resolve from raw seller fields.
    #[must_use]
    pub fn resolve(seller_name: &str, method: Option<&str>, details: Option<&str>) -> Self {
        let Some(details) = details.filter(|d| !d.is_empty()) else {
            return Self::Unavailable(format!("No contact details available for {seller_name}"));
        };

        match method {
            Some("email") => Self::Open(format!("mailto:{details}")),
            Some("whatsapp") => {
                let number: String = details.chars().filter(char::is_ascii_digit).collect();
                Self::Open(format!("https://wa.me/{number}"))
            }
            Some("telegram") => {
                let user = details.strip_prefix('@').unwrap_or(details);
                Self::Open(format!("https://t.me/{user}"))
            }
            other => Self::Show(format!(
                "Contact {seller_name} via {}: {details}",
                other.unwrap_or("unknown")
            )),
        }
    }
}
