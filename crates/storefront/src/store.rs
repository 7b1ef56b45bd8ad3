//! The cart store.
//!
//! [`CartStore`] is the single source of truth for what is in the cart. It
//! owns the in-memory snapshot, publishes it to subscribers over a
//! `tokio::sync::watch` channel, and routes every change through a
//! [`CartBackend`]. The published snapshot is only ever replaced with what the
//! backend returned, so it never runs ahead of durable state.
//!
//! # Ordering
//!
//! Loads and mutations run one at a time, in the order they were issued, on a
//! per-store FIFO queue. Two overlapping calls therefore resolve as if they
//! had been awaited back to back; the last call wins.
//!
//! # Failures
//!
//! Nothing here returns an error. Backend failures are logged, forwarded to
//! the [`Notifier`], and leave the cart unchanged (mutations and reloads) or
//! empty (initial load). A mutation that fails part way publishes the cart
//! the backend reports alongside the error.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use campus_market_core::{CartLine, CartSnapshot, Price, Product, ProductId};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, instrument, warn};

use crate::backend::{BackendError, CartBackend};
use crate::notify::{CartNotice, CartOperation, Notifier, SilentNotifier};

/// What subscribers observe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartState {
    /// Current cart contents.
    pub snapshot: Arc<CartSnapshot>,
    /// True until the first load settles (and during reloads).
    pub loading: bool,
}

impl CartState {
    fn settled(snapshot: CartSnapshot) -> Self {
        Self {
            snapshot: Arc::new(snapshot),
            loading: false,
        }
    }
}

/// Cart store over a pluggable backend.
pub struct CartStore<B> {
    backend: B,
    state: watch::Sender<CartState>,
    /// Serializes backend round trips.
    queue: Mutex<()>,
    loaded: AtomicBool,
    notifier: Arc<dyn Notifier>,
}

impl<B: CartBackend> CartStore<B> {
    /// Create a store that has not loaded yet: empty and `loading`.
    #[must_use]
    pub fn new(backend: B) -> Self {
        let (state, _) = watch::channel(CartState {
            snapshot: Arc::new(CartSnapshot::empty()),
            loading: true,
        });
        Self {
            backend,
            state,
            queue: Mutex::new(()),
            loaded: AtomicBool::new(false),
            notifier: Arc::new(SilentNotifier),
        }
    }

    /// Create a store and load the cart before returning it.
    pub async fn open(backend: B) -> Self {
        let store = Self::new(backend);
        store.load().await;
        store
    }

    /// Route absorbed failures to `notifier`.
    #[must_use]
    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Arc::new(notifier);
        self
    }

    /// The backend this store writes through.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Watch the cart. The receiver sees every published state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.state.subscribe()
    }

    /// Current state (snapshot plus loading flag).
    #[must_use]
    pub fn state(&self) -> CartState {
        self.state.borrow().clone()
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<CartSnapshot> {
        Arc::clone(&self.state.borrow().snapshot)
    }

    /// Current lines in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<CartLine> {
        self.state.borrow().snapshot.lines().to_vec()
    }

    /// Current total.
    #[must_use]
    pub fn total(&self) -> Price {
        self.state.borrow().snapshot.total()
    }

    /// Whether a product is in the cart. `5` and `"5"` are the same product.
    #[must_use]
    pub fn is_in_cart(&self, id: impl Into<ProductId>) -> bool {
        self.state.borrow().snapshot.contains(&id.into())
    }

    /// Whether a load is in progress or has not happened yet.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Load (or reload) the cart from the backend.
    ///
    /// If the first load fails the cart becomes empty; a failed reload keeps
    /// the cart as it was. `loading` is false afterwards.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Arc<CartSnapshot> {
        self.state.send_modify(|state| state.loading = true);
        let _turn = self.queue.lock().await;
        self.load_locked().await;
        self.snapshot()
    }

    /// Add a product. Adding a product already in the cart does nothing.
    ///
    /// Products without an identifier cannot be added.
    #[instrument(skip(self, product), fields(product_id = ?product.id))]
    pub async fn add_item(&self, product: &Product) -> Arc<CartSnapshot> {
        let line = match CartLine::from_product(product) {
            Ok(line) => line,
            Err(e) => {
                debug!(error = %e, title = %product.title, "Ignoring add");
                return self.snapshot();
            }
        };

        let _turn = self.queue.lock().await;
        self.ensure_loaded().await;

        if self.snapshot().contains(&line.id) {
            debug!("Already in cart");
            return self.snapshot();
        }

        let result = self.backend.add(&line).await;
        self.settle(CartOperation::Add, result)
    }

    /// Remove a product. Removing a product not in the cart does nothing.
    #[instrument(skip(self, id))]
    pub async fn remove_item(&self, id: impl Into<ProductId>) -> Arc<CartSnapshot> {
        let id = id.into();

        let _turn = self.queue.lock().await;
        self.ensure_loaded().await;

        if !self.snapshot().contains(&id) {
            debug!(product_id = %id, "Not in cart");
            return self.snapshot();
        }

        let result = self.backend.remove(&id).await;
        self.settle(CartOperation::Remove, result)
    }

    /// Empty the cart.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Arc<CartSnapshot> {
        let _turn = self.queue.lock().await;
        self.ensure_loaded().await;

        let result = self.backend.clear().await;
        self.settle(CartOperation::Clear, result)
    }

    // =========================================================================
    // Internals (callers hold the queue)
    // =========================================================================

    async fn ensure_loaded(&self) {
        if !self.loaded.load(Ordering::Acquire) {
            self.load_locked().await;
        }
    }

    async fn load_locked(&self) {
        match self.backend.load().await {
            Ok(snapshot) => {
                info!(items = snapshot.len(), "Cart loaded");
                self.loaded.store(true, Ordering::Release);
                self.state.send_replace(CartState::settled(snapshot));
            }
            Err(e) => {
                self.notifier.notify(&CartNotice::LoadFailed {
                    message: e.to_string(),
                });
                if self.loaded.swap(true, Ordering::AcqRel) {
                    warn!(error = %e, "Failed to reload cart, keeping previous cart");
                    self.state.send_modify(|state| state.loading = false);
                } else {
                    warn!(error = %e, "Failed to load cart, starting empty");
                    self.state.send_replace(CartState::settled(CartSnapshot::empty()));
                }
            }
        }
    }

    fn settle(
        &self,
        operation: CartOperation,
        result: Result<CartSnapshot, BackendError>,
    ) -> Arc<CartSnapshot> {
        match result {
            Ok(snapshot) => {
                debug!(%operation, items = snapshot.len(), "Cart updated");
                self.state.send_replace(CartState::settled(snapshot));
            }
            Err(e) => {
                let message = e.to_string();
                if let BackendError::Incomplete { cart, .. } = e {
                    warn!(%operation, error = %message, "Cart operation stopped part way, adopting server cart");
                    self.state.send_replace(CartState::settled(cart));
                } else {
                    warn!(%operation, error = %message, "Cart operation failed, keeping previous cart");
                }
                self.notifier.notify(&CartNotice::MutationFailed { operation, message });
            }
        }
        self.snapshot()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use rust_decimal::Decimal;
    use serde_json::{Value, json};

    use super::*;
    use crate::api::ApiError;

    /// Backend behaving like a server cart, with switchable failures.
    #[derive(Default)]
    struct FakeServer {
        cart: StdMutex<CartSnapshot>,
        fail_load: AtomicBool,
        fail_mutations: AtomicBool,
        add_delay: Option<Duration>,
        calls: AtomicUsize,
    }

    impl FakeServer {
        fn seeded(lines: &[Value]) -> Self {
            let seeded = lines
                .iter()
                .map(|v| serde_json::from_value::<CartLine>(v.clone()).unwrap())
                .collect();
            Self {
                cart: StdMutex::new(seeded),
                ..Self::default()
            }
        }

        fn mutate(
            &self,
            change: impl FnOnce(&CartSnapshot) -> CartSnapshot,
        ) -> Result<CartSnapshot, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_mutations.load(Ordering::SeqCst) {
                return Err(BackendError::Api(ApiError::Status {
                    status: 503,
                    message: "unavailable".to_string(),
                }));
            }
            let mut cart = self.cart.lock().unwrap();
            *cart = change(&cart);
            Ok(cart.clone())
        }
    }

    impl CartBackend for FakeServer {
        async fn load(&self) -> Result<CartSnapshot, BackendError> {
            if self.fail_load.load(Ordering::SeqCst) {
                return Err(BackendError::Api(ApiError::Status {
                    status: 500,
                    message: "boom".to_string(),
                }));
            }
            Ok(self.cart.lock().unwrap().clone())
        }

        async fn add(&self, line: &CartLine) -> Result<CartSnapshot, BackendError> {
            if let Some(delay) = self.add_delay {
                tokio::time::sleep(delay).await;
            }
            self.mutate(|cart| cart.with_line(line.clone()))
        }

        async fn remove(&self, id: &ProductId) -> Result<CartSnapshot, BackendError> {
            self.mutate(|cart| cart.without(id))
        }

        async fn clear(&self) -> Result<CartSnapshot, BackendError> {
            self.mutate(|_| CartSnapshot::empty())
        }
    }

    fn product(value: Value) -> Product {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_empty_cart_before_and_after_load() {
        let store = CartStore::new(FakeServer::default());
        assert!(store.is_loading());
        assert!(store.items().is_empty());

        store.load().await;
        assert!(!store.is_loading());
        assert!(store.items().is_empty());
        assert_eq!(store.total(), Price::ZERO);
        assert!(!store.is_in_cart("anything"));
    }

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let store = CartStore::open(FakeServer::default()).await;
        let lamp = product(json!({"_id": "abc", "price": 15}));

        let once = store.add_item(&lamp).await;
        let twice = store.add_item(&lamp).await;

        assert_eq!(once, twice);
        assert_eq!(store.items().len(), 1);
        assert_eq!(store.total().amount(), Decimal::from(15));
        assert_eq!(store.backend().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_numeric_and_string_ids_agree() {
        let store = CartStore::open(FakeServer::default()).await;
        store.add_item(&product(json!({"id": 5, "price": 1}))).await;

        assert!(store.is_in_cart("5"));
        assert!(store.is_in_cart(5_i64));

        store.add_item(&product(json!({"_id": "5", "price": 1}))).await;
        assert_eq!(store.items().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_then_not_in_cart() {
        let store = CartStore::open(FakeServer::default()).await;
        store.add_item(&product(json!({"_id": 1, "price": 10}))).await;
        store.add_item(&product(json!({"_id": 2, "price": "20"}))).await;

        store.remove_item(1_i64).await;
        assert!(!store.is_in_cart("1"));
        assert!(store.is_in_cart("2"));

        let before = store.snapshot();
        let calls = store.backend().calls.load(Ordering::SeqCst);
        let after = store.remove_item("missing").await;
        assert_eq!(before, after);
        assert_eq!(store.backend().calls.load(Ordering::SeqCst), calls);
    }

    #[tokio::test]
    async fn test_total_coerces_prices() {
        let store = CartStore::open(FakeServer::default()).await;
        store.add_item(&product(json!({"_id": "a", "price": 10}))).await;
        store.add_item(&product(json!({"_id": "b", "price": "20"}))).await;
        store.add_item(&product(json!({"_id": "c", "price": null}))).await;
        assert_eq!(store.total().amount(), Decimal::from(30));
    }

    #[tokio::test]
    async fn test_product_without_id_is_ignored() {
        let store = CartStore::open(FakeServer::default()).await;
        store.add_item(&product(json!({"title": "mystery", "price": 99}))).await;
        assert!(store.items().is_empty());
        assert_eq!(store.backend().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_load_failure_yields_empty_cart_and_notice() {
        let notices = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&notices);

        let server = FakeServer::seeded(&[json!({"_id": "x", "price": 3})]);
        server.fail_load.store(true, Ordering::SeqCst);

        let store = CartStore::new(server).with_notifier(move |notice: &CartNotice| {
            sink.lock().unwrap().push(notice.clone());
        });
        assert!(store.is_loading());

        store.load().await;
        assert!(!store.is_loading());
        assert!(store.items().is_empty());
        assert!(matches!(
            notices.lock().unwrap().as_slice(),
            [CartNotice::LoadFailed { .. }]
        ));
    }

    #[tokio::test]
    async fn test_reload_failure_keeps_cart() {
        let notices = Arc::new(AtomicUsize::new(0));
        let count = Arc::clone(&notices);

        let store = CartStore::open(FakeServer::seeded(&[json!({"_id": "x", "price": 3})]))
            .await
            .with_notifier(move |_: &CartNotice| {
                count.fetch_add(1, Ordering::SeqCst);
            });
        store.backend().fail_load.store(true, Ordering::SeqCst);

        let reloaded = store.load().await;
        assert!(!store.is_loading());
        assert!(reloaded.contains(&ProductId::from("x")));
        assert_eq!(store.total().amount(), Decimal::from(3));
        assert_eq!(notices.load(Ordering::SeqCst), 1);

        // The item is still removable
        store.remove_item("x").await;
        assert!(!store.is_in_cart("x"));
        assert_eq!(store.backend().calls.load(Ordering::SeqCst), 1);
        assert!(store.backend().cart.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mutation_failure_keeps_snapshot() {
        let notices = Arc::new(AtomicUsize::new(0));
        let count = Arc::clone(&notices);

        let store = CartStore::open(FakeServer::seeded(&[json!({"_id": "x", "price": 3})]))
            .await
            .with_notifier(move |_: &CartNotice| {
                count.fetch_add(1, Ordering::SeqCst);
            });
        store.backend().fail_mutations.store(true, Ordering::SeqCst);

        store.add_item(&product(json!({"_id": "y", "price": 4}))).await;
        store.remove_item("x").await;
        store.clear_cart().await;

        assert_eq!(store.items().len(), 1);
        assert!(store.is_in_cart("x"));
        assert_eq!(notices.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_partial_failure_adopts_reported_cart() {
        struct PartialClear;

        impl CartBackend for PartialClear {
            async fn load(&self) -> Result<CartSnapshot, BackendError> {
                Ok(CartSnapshot::from_lines([
                    serde_json::from_value::<CartLine>(json!({"_id": "a", "price": 1})).unwrap(),
                    serde_json::from_value::<CartLine>(json!({"_id": "b", "price": 2})).unwrap(),
                ]))
            }

            async fn add(&self, _line: &CartLine) -> Result<CartSnapshot, BackendError> {
                unreachable!()
            }

            async fn remove(&self, _id: &ProductId) -> Result<CartSnapshot, BackendError> {
                unreachable!()
            }

            async fn clear(&self) -> Result<CartSnapshot, BackendError> {
                Err(BackendError::Incomplete {
                    cart: CartSnapshot::from_lines([serde_json::from_value::<CartLine>(
                        json!({"_id": "b", "price": 2}),
                    )
                    .unwrap()]),
                    source: Box::new(BackendError::Api(ApiError::Status {
                        status: 500,
                        message: "boom".to_string(),
                    })),
                })
            }
        }

        let notices = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&notices);
        let store = CartStore::open(PartialClear)
            .await
            .with_notifier(move |notice: &CartNotice| {
                sink.lock().unwrap().push(notice.clone());
            });
        assert_eq!(store.items().len(), 2);

        store.clear_cart().await;
        assert!(!store.is_in_cart("a"));
        assert!(store.is_in_cart("b"));
        assert_eq!(store.total().amount(), Decimal::from(2));
        assert!(matches!(
            notices.lock().unwrap().as_slice(),
            [CartNotice::MutationFailed {
                operation: CartOperation::Clear,
                ..
            }]
        ));
    }

    #[tokio::test]
    async fn test_server_response_replaces_snapshot() {
        let store = CartStore::open(FakeServer::default()).await;
        store.add_item(&product(json!({"_id": "a"}))).await;

        // Another client added "b" server-side; the next response carries it.
        *store.backend().cart.lock().unwrap() = CartSnapshot::from_lines([
            serde_json::from_value::<CartLine>(json!({"_id": "a"})).unwrap(),
            serde_json::from_value::<CartLine>(json!({"_id": "b"})).unwrap(),
        ]);
        store.add_item(&product(json!({"_id": "c"}))).await;

        let ids: Vec<String> = store.items().into_iter().map(|l| l.id.into_inner()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_clear() {
        let store = CartStore::open(FakeServer::seeded(&[
            json!({"_id": "a", "price": 1}),
            json!({"_id": "b", "price": 2}),
        ]))
        .await;
        assert_eq!(store.items().len(), 2);

        store.clear_cart().await;
        assert!(store.items().is_empty());
        assert_eq!(store.total(), Price::ZERO);
    }

    #[tokio::test]
    async fn test_mutation_before_load_loads_first() {
        let store = CartStore::new(FakeServer::seeded(&[json!({"_id": "kept"})]));
        store.add_item(&product(json!({"_id": "new"}))).await;

        assert!(!store.is_loading());
        assert!(store.is_in_cart("kept"));
        assert!(store.is_in_cart("new"));
    }

    #[tokio::test]
    async fn test_overlapping_mutations_apply_in_call_order() {
        let server = FakeServer {
            add_delay: Some(Duration::from_millis(30)),
            ..FakeServer::default()
        };
        let store = CartStore::open(server).await;
        let item = product(json!({"_id": "race", "price": 5}));

        tokio::join!(store.add_item(&item), async {
            tokio::task::yield_now().await;
            store.remove_item("race").await;
        });

        assert!(!store.is_in_cart("race"));
        assert!(store.backend().cart.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let store = CartStore::new(FakeServer::default());
        let mut rx = store.subscribe();
        assert!(rx.borrow_and_update().loading);

        store.load().await;
        store.add_item(&product(json!({"_id": "a", "price": 2}))).await;

        assert!(rx.has_changed().unwrap());
        let state = rx.borrow_and_update().clone();
        assert!(!state.loading);
        assert_eq!(state.snapshot.len(), 1);
    }

    #[tokio::test]
    async fn test_updates_without_subscribers() {
        let store = CartStore::new(FakeServer::default());
        drop(store.subscribe());
        store.add_item(&product(json!({"_id": "late"}))).await;
        assert!(store.is_in_cart("late"));
    }
}
