//! Storefront runtime shared across callers.

use std::sync::Arc;

use campus_market_core::{CartSnapshot, ProductId, SessionId};
use tracing::{info, instrument};

use crate::api::ApiClient;
use crate::backend::Backend;
use crate::catalog::CatalogClient;
use crate::config::StorefrontConfig;
use crate::error::{AppError, Result};
use crate::notify::{Notifier, SilentNotifier};
use crate::session::SessionIdProvider;
use crate::storage::{DurableStorage, FileStorage};
use crate::store::CartStore;

/// Everything a storefront client needs, built once from configuration.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// catalog, the cart store, and the anonymous session.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: StorefrontConfig,
    catalog: CatalogClient,
    cart: Arc<CartStore<Backend>>,
    sessions: SessionIdProvider,
}

impl Storefront {
    /// Build the runtime over file storage in `config.storage_dir`.
    ///
    /// The cart is not loaded yet; call [`Storefront::load_cart`] or let the
    /// first cart operation load it.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the configured
    /// cart mode cannot be served.
    pub fn from_config(config: StorefrontConfig) -> Result<Self> {
        let storage: Arc<dyn DurableStorage> = Arc::new(FileStorage::new(config.storage_dir.clone()));
        Self::new(config, storage, SilentNotifier)
    }

    /// Build the runtime over the given storage, routing cart failures to
    /// `notifier`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the configured
    /// cart mode cannot be served.
    pub fn new(
        config: StorefrontConfig,
        storage: Arc<dyn DurableStorage>,
        notifier: impl Notifier + 'static,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        let catalog = CatalogClient::new(
            ApiClient::new(http.clone(), &config.api_url),
            config.catalog_ttl,
        );
        let sessions = SessionIdProvider::new(Arc::clone(&storage));
        let backend = Backend::from_config(&config, storage, sessions.clone(), http)?;
        let cart = CartStore::new(backend).with_notifier(notifier);

        info!(
            api_url = %config.api_url,
            cart_mode = %config.cart_mode,
            "Storefront initialized"
        );

        Ok(Self {
            inner: Arc::new(StorefrontInner {
                config,
                catalog,
                cart: Arc::new(cart),
                sessions,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the catalog client.
    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.inner.catalog
    }

    /// Get a reference to the cart store.
    #[must_use]
    pub fn cart(&self) -> &CartStore<Backend> {
        &self.inner.cart
    }

    /// Shared handle to the cart store, for moving into tasks.
    #[must_use]
    pub fn cart_handle(&self) -> Arc<CartStore<Backend>> {
        Arc::clone(&self.inner.cart)
    }

    /// The anonymous session id for this client, created on first use.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.inner.sessions.session_id()
    }

    /// Load the cart from its backend.
    pub async fn load_cart(&self) -> Arc<CartSnapshot> {
        self.inner.cart.load().await
    }

    /// Resolve a listing through the catalog and add it to the cart.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no listing has this id, or
    /// `AppError::Catalog` if the catalog cannot be fetched.
    #[instrument(skip(self, id))]
    pub async fn add_product_by_id(&self, id: impl Into<ProductId>) -> Result<Arc<CartSnapshot>> {
        let id = id.into();
        let product = self
            .inner
            .catalog
            .find(&id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
        Ok(self.inner.cart.add_item(&product).await)
    }
}
