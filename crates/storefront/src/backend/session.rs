//! Server cart addressed by the anonymous session id.
//!
//! # Endpoints
//!
//! - `GET /api/cart/{sessionId}` - current cart
//! - `POST /api/cart/{sessionId}` with `{ "productId": ... }` - add
//! - `DELETE /api/cart/{sessionId}/{productId}` - remove
//!
//! Each returns the resulting list of cart lines. There is no clear endpoint,
//! so [`SessionBackend::clear`] removes the lines one at a time. If a removal
//! fails after others succeeded, the cart is fetched again and reported in
//! [`BackendError::Incomplete`].

use campus_market_core::{CartLine, CartSnapshot, ProductId};
use reqwest::Method;
use serde_json::json;
use tracing::{debug, instrument, warn};

use super::{ApiClient, BackendError, CartBackend};
use crate::session::SessionIdProvider;

/// Session-keyed server cart backend.
pub struct SessionBackend {
    api: ApiClient,
    sessions: SessionIdProvider,
}

impl SessionBackend {
    /// Create a backend that addresses carts by the provider's session id.
    #[must_use]
    pub const fn new(api: ApiClient, sessions: SessionIdProvider) -> Self {
        Self { api, sessions }
    }

    async fn cart_path(&self) -> String {
        let session_id = self.sessions.resolve().await;
        format!("api/cart/{}", urlencoding::encode(session_id.as_str()))
    }
}

impl CartBackend for SessionBackend {
    #[instrument(skip(self))]
    async fn load(&self) -> Result<CartSnapshot, BackendError> {
        let request = self.api.request(Method::GET, &self.cart_path().await);
        self.api.send_cart(request).await
    }

    #[instrument(skip(self, line), fields(product_id = %line.id))]
    async fn add(&self, line: &CartLine) -> Result<CartSnapshot, BackendError> {
        let request = self
            .api
            .request(Method::POST, &self.cart_path().await)
            .json(&json!({ "productId": line.id }));
        self.api.send_cart(request).await
    }

    #[instrument(skip(self))]
    async fn remove(&self, id: &ProductId) -> Result<CartSnapshot, BackendError> {
        let path = format!(
            "{}/{}",
            self.cart_path().await,
            urlencoding::encode(id.as_str())
        );
        let request = self.api.request(Method::DELETE, &path);
        self.api.send_cart(request).await
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<CartSnapshot, BackendError> {
        let mut snapshot = self.load().await?;
        let ids: Vec<ProductId> = snapshot.lines().iter().map(|line| line.id.clone()).collect();
        debug!(items = ids.len(), "Clearing session cart line by line");

        for (removed, id) in ids.iter().enumerate() {
            match self.remove(id).await {
                Ok(next) => snapshot = next,
                Err(e) if removed == 0 => return Err(e),
                Err(e) => {
                    warn!(error = %e, removed, "Clear stopped part way, refetching cart");
                    let cart = match self.load().await {
                        Ok(current) => current,
                        Err(reload) => {
                            warn!(error = %reload, "Refetch failed, reporting last known cart");
                            snapshot
                        }
                    };
                    return Err(BackendError::Incomplete {
                        cart,
                        source: Box::new(e),
                    });
                }
            }
        }
        Ok(snapshot)
    }
}
