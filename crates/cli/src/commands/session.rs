//! Session inspection command.

use campus_market_storefront::state::Storefront;

/// Print the anonymous session id and the active configuration.
#[allow(clippy::print_stdout)]
pub fn show(storefront: &Storefront) {
    let config = storefront.config();
    println!("Session id:   {}", storefront.session_id());
    println!("Cart mode:    {}", config.cart_mode);
    println!("API:          {}", config.api_url);
    println!("Storage:      {}", config.storage_dir.display());
    println!(
        "Auth token:   {}",
        if config.auth_token().is_some() {
            "configured"
        } else {
            "not set"
        }
    );
}
