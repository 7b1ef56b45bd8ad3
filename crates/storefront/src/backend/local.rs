//! Cart kept entirely in durable client storage.

use std::sync::{Arc, Mutex, PoisonError};

use campus_market_core::{CartLine, CartSnapshot, ProductId};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::{BackendError, CartBackend, snapshot_from_values};
use crate::storage::{self, DurableStorage, keys};

/// Local-only cart backend.
///
/// The cart is stored as a JSON array of lines under [`keys::CART`]. An
/// in-memory copy keeps the cart usable when storage rejects writes; in that
/// case changes last only as long as the process.
pub struct LocalBackend {
    storage: Arc<dyn DurableStorage>,
    current: Mutex<CartSnapshot>,
}

impl LocalBackend {
    /// Create a backend over durable storage.
    #[must_use]
    pub fn new(storage: Arc<dyn DurableStorage>) -> Self {
        Self {
            storage,
            current: Mutex::new(CartSnapshot::empty()),
        }
    }

    /// Read the stored cart, treating unreadable or corrupt data as empty.
    async fn read_stored(&self) -> CartSnapshot {
        let handle = Arc::clone(&self.storage);
        let raw = match storage::blocking(move || handle.get(keys::CART)).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return CartSnapshot::empty(),
            Err(e) => {
                warn!(error = %e, "Cart storage unreadable, starting with an empty cart");
                return CartSnapshot::empty();
            }
        };

        match serde_json::from_str::<Vec<Value>>(&raw) {
            Ok(values) => snapshot_from_values(values),
            Err(e) => {
                warn!(error = %e, "Failed to parse stored cart, starting with an empty cart");
                CartSnapshot::empty()
            }
        }
    }

    /// Apply a change, persist it, and adopt it as the current cart.
    ///
    /// Callers are serialized by the cart store, so the lock is not held
    /// while writing.
    async fn apply(
        &self,
        change: impl FnOnce(&CartSnapshot) -> CartSnapshot,
    ) -> Result<CartSnapshot, BackendError> {
        let next = change(&self.current());
        let serialized = serde_json::to_string(next.lines())?;

        let handle = Arc::clone(&self.storage);
        if let Err(e) = storage::blocking(move || handle.set(keys::CART, &serialized)).await {
            warn!(error = %e, "Failed to persist cart, keeping it in memory only");
        }

        self.adopt(&next);
        Ok(next)
    }

    fn current(&self) -> CartSnapshot {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn adopt(&self, snapshot: &CartSnapshot) {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone_from(snapshot);
    }
}

impl CartBackend for LocalBackend {
    #[instrument(skip(self))]
    async fn load(&self) -> Result<CartSnapshot, BackendError> {
        let snapshot = self.read_stored().await;
        debug!(items = snapshot.len(), "Loaded local cart");
        self.adopt(&snapshot);
        Ok(snapshot)
    }

    #[instrument(skip(self, line), fields(product_id = %line.id))]
    async fn add(&self, line: &CartLine) -> Result<CartSnapshot, BackendError> {
        self.apply(|current| current.with_line(line.clone())).await
    }

    #[instrument(skip(self))]
    async fn remove(&self, id: &ProductId) -> Result<CartSnapshot, BackendError> {
        self.apply(|current| current.without(id)).await
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<CartSnapshot, BackendError> {
        self.apply(|_| CartSnapshot::empty()).await
    }
}
