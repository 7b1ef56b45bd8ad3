//! Server cart owned by the authenticated user.
//!
//! # Endpoints
//!
//! - `GET /api/cart` - current cart
//! - `POST /api/cart` with `{ "productId": ... }` - add
//! - `DELETE /api/cart/{productId}` - remove
//! - `DELETE /api/cart` - clear
//!
//! Each returns `{ "items": [...] }`. Requests carry a bearer token.

use campus_market_core::{CartLine, CartSnapshot, ProductId};
use reqwest::Method;
use serde_json::json;
use tracing::instrument;

use super::{ApiClient, BackendError, CartBackend};

const CART_PATH: &str = "api/cart";

/// User-keyed server cart backend.
pub struct AuthenticatedBackend {
    api: ApiClient,
}

impl AuthenticatedBackend {
    /// Create a backend over an API client that carries the user's token.
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

impl CartBackend for AuthenticatedBackend {
    #[instrument(skip(self))]
    async fn load(&self) -> Result<CartSnapshot, BackendError> {
        self.api
            .send_cart(self.api.request(Method::GET, CART_PATH))
            .await
    }

    #[instrument(skip(self, line), fields(product_id = %line.id))]
    async fn add(&self, line: &CartLine) -> Result<CartSnapshot, BackendError> {
        let request = self
            .api
            .request(Method::POST, CART_PATH)
            .json(&json!({ "productId": line.id }));
        self.api.send_cart(request).await
    }

    #[instrument(skip(self))]
    async fn remove(&self, id: &ProductId) -> Result<CartSnapshot, BackendError> {
        let path = format!("{CART_PATH}/{}", urlencoding::encode(id.as_str()));
        self.api
            .send_cart(self.api.request(Method::DELETE, &path))
            .await
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<CartSnapshot, BackendError> {
        self.api
            .send_cart(self.api.request(Method::DELETE, CART_PATH))
            .await
    }
}
