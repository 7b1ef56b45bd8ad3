//! Cart responses from the marketplace API.

use campus_market_core::CartSnapshot;
use reqwest::RequestBuilder;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{BackendError, snapshot_from_values};
use crate::api::ApiClient;

/// Cart response bodies.
///
/// The session API returns a bare array of lines; the authenticated API wraps
/// them as `{ "items": [...] }`. Both are accepted from either.
#[derive(Deserialize)]
#[serde(untagged)]
enum CartPayload {
    Lines(Vec<Value>),
    Wrapped {
        #[serde(default)]
        items: Vec<Value>,
    },
}

impl ApiClient {
    /// Send a cart request and parse the returned cart.
    pub(super) async fn send_cart(
        &self,
        request: RequestBuilder,
    ) -> Result<CartSnapshot, BackendError> {
        let body = self.send_text(request).await?;
        let snapshot = parse_cart_payload(&body)?;
        debug!(items = snapshot.len(), "Received cart");
        Ok(snapshot)
    }
}

/// Parse a cart response body. An empty body is an empty cart.
pub(super) fn parse_cart_payload(body: &str) -> Result<CartSnapshot, BackendError> {
    if body.trim().is_empty() {
        return Ok(CartSnapshot::empty());
    }
    let values = match serde_json::from_str::<CartPayload>(body)? {
        CartPayload::Lines(values) | CartPayload::Wrapped { items: values } => values,
    };
    Ok(snapshot_from_values(values))
}
