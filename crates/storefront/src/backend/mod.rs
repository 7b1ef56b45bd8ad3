//! Cart backends.
//!
//! Every place a cart can durably live implements [`CartBackend`]. The store
//! picks one at construction time and never cares which:
//!
//! - [`LocalBackend`] - durable client storage only, no network
//! - [`SessionBackend`] - server cart keyed by the anonymous session id
//! - [`AuthenticatedBackend`] - server cart keyed by the logged-in user
//!
//! Each operation returns the complete, authoritative cart after the change.

mod authenticated;
mod local;
mod remote;
mod session;

use std::future::Future;
use std::sync::Arc;

use campus_market_core::{CartLine, CartSnapshot, Product, ProductId};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::api::{ApiClient, ApiError};
use crate::config::{CartMode, StorefrontConfig};
use crate::session::SessionIdProvider;
use crate::storage::DurableStorage;

pub use authenticated::AuthenticatedBackend;
pub use local::LocalBackend;
pub use session::SessionBackend;

/// Errors that can occur when talking to a cart backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Marketplace API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Response or stored data was not valid JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The operation failed after changing part of the cart. `cart` is the
    /// cart as it stands now.
    #[error("{source} (cart partially updated)")]
    Incomplete {
        cart: CartSnapshot,
        source: Box<BackendError>,
    },

    /// Backend cannot be built from the given configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Capability interface over a cart's durable home.
pub trait CartBackend: Send + Sync {
    /// Fetch the current cart.
    fn load(&self) -> impl Future<Output = Result<CartSnapshot, BackendError>> + Send;

    /// Add a line and return the resulting cart.
    fn add(&self, line: &CartLine)
    -> impl Future<Output = Result<CartSnapshot, BackendError>> + Send;

    /// Remove a product and return the resulting cart.
    fn remove(
        &self,
        id: &ProductId,
    ) -> impl Future<Output = Result<CartSnapshot, BackendError>> + Send;

    /// Empty the cart and return the resulting (normally empty) cart.
    fn clear(&self) -> impl Future<Output = Result<CartSnapshot, BackendError>> + Send;
}

/// The backend selected by configuration.
pub enum Backend {
    Local(LocalBackend),
    Session(SessionBackend),
    Authenticated(AuthenticatedBackend),
}

impl Backend {
    /// Build the backend named by `config.cart_mode`.
    ///
    /// # Errors
    ///
    /// Session mode addresses the server cart with `sessions`; pass the same
    /// provider the rest of the client reports its session id from.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Config` if authenticated mode has no token.
    pub fn from_config(
        config: &StorefrontConfig,
        storage: Arc<dyn DurableStorage>,
        sessions: SessionIdProvider,
        http: reqwest::Client,
    ) -> Result<Self, BackendError> {
        Ok(match config.cart_mode {
            CartMode::Local => Self::Local(LocalBackend::new(storage)),
            CartMode::Session => Self::Session(SessionBackend::new(
                ApiClient::new(http, &config.api_url),
                sessions,
            )),
            CartMode::Authenticated => {
                let token = config.auth_token.clone().ok_or_else(|| {
                    BackendError::Config("authenticated mode requires an auth token".to_string())
                })?;
                Self::Authenticated(AuthenticatedBackend::new(
                    ApiClient::new(http, &config.api_url).with_bearer(token),
                ))
            }
        })
    }

    /// Mode this backend implements.
    #[must_use]
    pub const fn mode(&self) -> CartMode {
        match self {
            Self::Local(_) => CartMode::Local,
            Self::Session(_) => CartMode::Session,
            Self::Authenticated(_) => CartMode::Authenticated,
        }
    }
}

impl CartBackend for Backend {
    async fn load(&self) -> Result<CartSnapshot, BackendError> {
        match self {
            Self::Local(b) => b.load().await,
            Self::Session(b) => b.load().await,
            Self::Authenticated(b) => b.load().await,
        }
    }

    async fn add(&self, line: &CartLine) -> Result<CartSnapshot, BackendError> {
        match self {
            Self::Local(b) => b.add(line).await,
            Self::Session(b) => b.add(line).await,
            Self::Authenticated(b) => b.add(line).await,
        }
    }

    async fn remove(&self, id: &ProductId) -> Result<CartSnapshot, BackendError> {
        match self {
            Self::Local(b) => b.remove(id).await,
            Self::Session(b) => b.remove(id).await,
            Self::Authenticated(b) => b.remove(id).await,
        }
    }

    async fn clear(&self) -> Result<CartSnapshot, BackendError> {
        match self {
            Self::Local(b) => b.clear().await,
            Self::Session(b) => b.clear().await,
            Self::Authenticated(b) => b.clear().await,
        }
    }
}

/// Build a snapshot from untrusted JSON records.
///
/// Records that are not products, or that carry no identifier, are skipped.
pub(crate) fn snapshot_from_values(values: Vec<Value>) -> CartSnapshot {
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<Product>(value) {
            Ok(product) => match CartLine::try_from(product) {
                Ok(line) => Some(line),
                Err(e) => {
                    warn!(error = %e, "Skipping cart record");
                    None
                }
            },
            Err(e) => {
                warn!(error = %e, "Skipping malformed cart record");
                None
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_snapshot_from_values_skips_unusable_records() {
        let snapshot = snapshot_from_values(vec![
            json!({"_id": "a", "price": 5}),
            json!({"title": "no id"}),
            json!("not an object"),
            json!({"id": 9, "price": "1.5"}),
        ]);
        let ids: Vec<&str> = snapshot.lines().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, ["a", "9"]);
    }

    #[test]
    fn test_from_config_selects_mode() {
        let url = url::Url::parse("http://localhost:5000").unwrap();
        let storage: Arc<dyn DurableStorage> = Arc::new(MemoryStorage::new());

        for mode in [CartMode::Local, CartMode::Session] {
            let config = StorefrontConfig::for_api(url.clone(), mode);
            let backend = Backend::from_config(
                &config,
                storage.clone(),
                SessionIdProvider::new(storage.clone()),
                reqwest::Client::new(),
            )
            .unwrap();
            assert_eq!(backend.mode(), mode);
        }
    }

    #[test]
    fn test_authenticated_without_token_fails() {
        let url = url::Url::parse("http://localhost:5000").unwrap();
        let config = StorefrontConfig::for_api(url, CartMode::Authenticated);
        let storage: Arc<dyn DurableStorage> = Arc::new(MemoryStorage::new());
        let result = Backend::from_config(
            &config,
            storage.clone(),
            SessionIdProvider::new(storage),
            reqwest::Client::new(),
        );
        assert!(matches!(result, Err(BackendError::Config(_))));
    }
}
