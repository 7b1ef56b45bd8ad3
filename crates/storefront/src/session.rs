//! Anonymous session identity.
//!
//! A browser profile without a login is identified by a random session id,
//! generated once and kept in durable storage under [`keys::SESSION_ID`].
//! The session cart backend uses it to address the server-side cart.

use std::sync::{Arc, OnceLock};

use campus_market_core::SessionId;
use tracing::{debug, warn};

use crate::storage::{DurableStorage, keys};

/// Produces the stable anonymous identifier for this client.
#[derive(Clone)]
pub struct SessionIdProvider {
    inner: Arc<SessionIdProviderInner>,
}

struct SessionIdProviderInner {
    storage: Arc<dyn DurableStorage>,
    /// Id handed out when storage is unusable, kept for this process only.
    fallback: OnceLock<SessionId>,
}

impl SessionIdProvider {
    /// Create a provider over durable storage.
    #[must_use]
    pub fn new(storage: Arc<dyn DurableStorage>) -> Self {
        Self {
            inner: Arc::new(SessionIdProviderInner {
                storage,
                fallback: OnceLock::new(),
            }),
        }
    }

    /// Get the session id, creating and persisting one on first use.
    ///
    /// Never fails: if storage cannot be read or written, a fresh id is used
    /// for the lifetime of this provider without being persisted.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        match self.inner.storage.get(keys::SESSION_ID) {
            Ok(Some(stored)) if !stored.is_empty() => SessionId::from(stored),
            Ok(_) => self.create(),
            Err(e) => {
                warn!(error = %e, "Session storage unreadable, using in-memory session id");
                self.fallback()
            }
        }
    }

    /// [`SessionIdProvider::session_id`] for async callers, run on the
    /// blocking thread pool so storage I/O does not stall the runtime.
    pub async fn resolve(&self) -> SessionId {
        let provider = self.clone();
        match tokio::task::spawn_blocking(move || provider.session_id()).await {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "Session lookup task failed, using in-memory session id");
                self.fallback()
            }
        }
    }

    fn create(&self) -> SessionId {
        if let Some(existing) = self.inner.fallback.get() {
            return existing.clone();
        }

        let id = SessionId::generate();
        match self.inner.storage.set(keys::SESSION_ID, id.as_str()) {
            Ok(()) => {
                debug!(session_id = %id, "Created session id");
                id
            }
            Err(e) => {
                warn!(error = %e, "Failed to persist session id, using in-memory session id");
                self.inner.fallback.get_or_init(|| id).clone()
            }
        }
    }

    fn fallback(&self) -> SessionId {
        self.inner
            .fallback
            .get_or_init(SessionId::generate)
            .clone()
    }
}
