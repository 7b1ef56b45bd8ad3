//! Integration test support for Campus Market.
//!
//! [`MockMarket`] is an in-process marketplace API served by `axum` on an
//! ephemeral port. It implements the product listing endpoint and both cart
//! APIs closely enough to exercise the storefront runtime end to end:
//!
//! - `GET /api/products`
//! - `GET|POST /api/cart/{sessionId}`, `DELETE /api/cart/{sessionId}/{productId}`
//! - `GET|POST|DELETE /api/cart`, `DELETE /api/cart/{productId}` (bearer token)
//!
//! Failures can be switched on per endpoint group to test degradation.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path as UrlPath, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get};
use axum::{Json, Router};
use campus_market_core::{ProductId, canonical_id};
use campus_market_storefront::config::{CartMode, StorefrontConfig};
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;

/// In-memory marketplace API.
#[derive(Clone, Default)]
pub struct MockMarket {
    inner: Arc<Mutex<MarketState>>,
}

#[derive(Default)]
struct MarketState {
    products: Vec<Value>,
    session_carts: HashMap<String, Vec<Value>>,
    user_cart: Vec<Value>,
    token: Option<String>,
    fail_cart: bool,
    fail_products: bool,
    /// Session-cart removals still allowed to succeed; `None` is unlimited.
    session_removals_left: Option<usize>,
    product_requests: usize,
    cart_requests: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddBody {
    product_id: Value,
}

impl MockMarket {
    /// A market listing `products`.
    #[must_use]
    pub fn new(products: Vec<Value>) -> Self {
        let market = Self::default();
        market.state().products = products;
        market
    }

    /// Require `token` as bearer credential on the authenticated cart API.
    #[must_use]
    pub fn with_token(self, token: &str) -> Self {
        self.state().token = Some(token.to_string());
        self
    }

    /// Serve on `127.0.0.1` at an ephemeral port and return the base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if no port can be bound.
    pub async fn serve(&self) -> std::io::Result<Url> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = self.router();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Url::parse(&format!("http://{addr}"))
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
    }

    /// Make every cart endpoint answer 500.
    pub fn fail_cart(&self, fail: bool) {
        self.state().fail_cart = fail;
    }

    /// Make the products endpoint answer 500.
    pub fn fail_products(&self, fail: bool) {
        self.state().fail_products = fail;
    }

    /// Let `count` more session-cart removals succeed, then answer 500 to the
    /// rest. Other cart endpoints are unaffected.
    pub fn fail_session_removals_after(&self, count: usize) {
        self.state().session_removals_left = Some(count);
    }

    /// Number of requests the products endpoint has served.
    #[must_use]
    pub fn product_requests(&self) -> usize {
        self.state().product_requests
    }

    /// Number of requests the cart endpoints have served.
    #[must_use]
    pub fn cart_requests(&self) -> usize {
        self.state().cart_requests
    }

    /// Ids in a session cart, in order.
    #[must_use]
    pub fn session_cart_ids(&self, session_id: &str) -> Vec<String> {
        self.state()
            .session_carts
            .get(session_id)
            .map(|lines| line_ids(lines))
            .unwrap_or_default()
    }

    /// Every session id a cart has been stored under.
    #[must_use]
    pub fn session_ids(&self) -> Vec<String> {
        self.state().session_carts.keys().cloned().collect()
    }

    /// Ids in the authenticated user's cart, in order.
    #[must_use]
    pub fn user_cart_ids(&self) -> Vec<String> {
        line_ids(&self.state().user_cart)
    }

    fn state(&self) -> MutexGuard<'_, MarketState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/api/products", get(products))
            .route(
                "/api/cart",
                get(user_cart).post(user_add).delete(user_clear),
            )
            .route(
                "/api/cart/{key}",
                get(session_cart).post(session_add).delete(user_remove),
            )
            .route("/api/cart/{session}/{product}", delete(session_remove))
            .with_state(self.clone())
    }
}

/// Listings covering string, numeric and legacy identifiers and odd prices.
#[must_use]
pub fn sample_products() -> Vec<Value> {
    vec![
        json!({
            "_id": "lamp-1",
            "title": "Desk Lamp",
            "description": "Warm LED, barely used",
            "price": 250,
            "category": "dorm-items",
            "condition": "like-new",
            "sellerName": "Asha",
            "contactMethod": "whatsapp",
            "contactDetails": "+91 98765 43210",
            "images": ["/uploads/lamp.jpg"]
        }),
        json!({
            "id": 42,
            "title": "Calculus Textbook",
            "description": "Stewart, 8th edition",
            "price": "400.50",
            "category": "textbooks",
            "sellerName": "Ravi",
            "contactMethod": "email",
            "contactDetails": "ravi@campus.edu"
        }),
        json!({
            "_id": "mug-7",
            "title": "Free Mug",
            "price": null,
            "category": "other",
            "sellerName": "Meera",
            "status": "sold"
        }),
        json!({
            "_id": 5,
            "title": "Scientific Calculator",
            "price": 10,
            "category": "electronics",
            "sellerName": "Kiran",
            "contactMethod": "telegram",
            "contactDetails": "@kiran"
        }),
    ]
}

/// Storefront configuration pointing at `api_url` with storage in `storage_dir`.
#[must_use]
pub fn config(api_url: Url, mode: CartMode, storage_dir: &Path) -> StorefrontConfig {
    let mut config = StorefrontConfig::for_api(api_url, mode);
    config.storage_dir = storage_dir.to_path_buf();
    config
}

// =============================================================================
// Handlers
// =============================================================================

fn record_id(record: &Value) -> Option<ProductId> {
    record
        .get("_id")
        .and_then(canonical_id)
        .or_else(|| record.get("id").and_then(canonical_id))
}

fn line_ids(lines: &[Value]) -> Vec<String> {
    lines
        .iter()
        .filter_map(record_id)
        .map(ProductId::into_inner)
        .collect()
}

fn server_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "message": "Internal server error" })),
    )
        .into_response()
}

fn authorized(state: &MarketState, headers: &HeaderMap) -> bool {
    let Some(token) = &state.token else {
        return true;
    };
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == format!("Bearer {token}"))
}

/// Add the listing `id` to `cart` unless present; `None` if no such listing.
fn add_to(products: &[Value], cart: &mut Vec<Value>, id: &ProductId) -> Option<()> {
    let product = products
        .iter()
        .find(|p| record_id(p).as_ref() == Some(id))?
        .clone();
    if !cart.iter().any(|line| record_id(line).as_ref() == Some(id)) {
        cart.push(product);
    }
    Some(())
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": "Product not found" })),
    )
        .into_response()
}

async fn products(State(market): State<MockMarket>) -> Response {
    let mut state = market.state();
    state.product_requests += 1;
    if state.fail_products {
        return server_error();
    }
    Json(state.products.clone()).into_response()
}

async fn session_cart(
    State(market): State<MockMarket>,
    UrlPath(session): UrlPath<String>,
) -> Response {
    let mut state = market.state();
    state.cart_requests += 1;
    if state.fail_cart {
        return server_error();
    }
    Json(state.session_carts.get(&session).cloned().unwrap_or_default()).into_response()
}

async fn session_add(
    State(market): State<MockMarket>,
    UrlPath(session): UrlPath<String>,
    Json(body): Json<AddBody>,
) -> Response {
    let mut state = market.state();
    state.cart_requests += 1;
    if state.fail_cart {
        return server_error();
    }
    let Some(id) = canonical_id(&body.product_id) else {
        return (StatusCode::BAD_REQUEST, "productId required").into_response();
    };

    let MarketState {
        products,
        session_carts,
        ..
    } = &mut *state;
    let cart = session_carts.entry(session).or_default();
    match add_to(products, cart, &id) {
        Some(()) => Json(cart.clone()).into_response(),
        None => not_found(),
    }
}

async fn session_remove(
    State(market): State<MockMarket>,
    UrlPath((session, product)): UrlPath<(String, String)>,
) -> Response {
    let mut state = market.state();
    state.cart_requests += 1;
    if state.fail_cart {
        return server_error();
    }
    if let Some(left) = state.session_removals_left.as_mut() {
        if *left == 0 {
            return server_error();
        }
        *left -= 1;
    }
    let id = ProductId::from(product);
    let cart = state.session_carts.entry(session).or_default();
    cart.retain(|line| record_id(line).as_ref() != Some(&id));
    Json(cart.clone()).into_response()
}

async fn user_cart(State(market): State<MockMarket>, headers: HeaderMap) -> Response {
    let mut state = market.state();
    state.cart_requests += 1;
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if state.fail_cart {
        return server_error();
    }
    Json(json!({ "items": state.user_cart })).into_response()
}

async fn user_add(
    State(market): State<MockMarket>,
    headers: HeaderMap,
    Json(body): Json<AddBody>,
) -> Response {
    let mut state = market.state();
    state.cart_requests += 1;
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if state.fail_cart {
        return server_error();
    }
    let Some(id) = canonical_id(&body.product_id) else {
        return (StatusCode::BAD_REQUEST, "productId required").into_response();
    };

    let MarketState {
        products,
        user_cart,
        ..
    } = &mut *state;
    match add_to(products, user_cart, &id) {
        Some(()) => Json(json!({ "items": user_cart })).into_response(),
        None => not_found(),
    }
}

async fn user_remove(
    State(market): State<MockMarket>,
    UrlPath(product): UrlPath<String>,
    headers: HeaderMap,
) -> Response {
    let mut state = market.state();
    state.cart_requests += 1;
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if state.fail_cart {
        return server_error();
    }
    let id = ProductId::from(product);
    state
        .user_cart
        .retain(|line| record_id(line).as_ref() != Some(&id));
    Json(json!({ "items": state.user_cart })).into_response()
}

async fn user_clear(State(market): State<MockMarket>, headers: HeaderMap) -> Response {
    let mut state = market.state();
    state.cart_requests += 1;
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if state.fail_cart {
        return server_error();
    }
    state.user_cart.clear();
    Json(json!({ "items": [] })).into_response()
}
