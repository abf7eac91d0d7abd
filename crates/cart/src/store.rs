//! The cart store: one consistent snapshot across both authority modes.
//!
//! All operations are async and processed in the order the caller issues
//! them; the store takes no lock across its own network awaits. Each
//! mutation is a self-contained read-modify-write against the latest known
//! snapshot - a caller that fires two mutations without awaiting the first
//! accepts lost-update risk. No operation is cancellable once issued and
//! the store enforces no timeout of its own (the HTTP client does).

use std::sync::Arc;

use tokio::sync::{RwLock, broadcast, watch};
use tracing::{debug, error, instrument, warn};
use zella_core::{Cart, ProductRef};

use crate::api::{CartApi, ProductCatalog};
use crate::auth::Identity;
use crate::error::CartError;
use crate::merge::{MergeReport, ReplayQueue};
use crate::persist::{KeyValueStore, keys};
use crate::signal::{SignalBus, TabId};

/// Owns the in-memory cart snapshot and keeps it consistent with the
/// active authority mode (anonymous vs. server-authoritative).
///
/// Cheaply cloneable; clones share the same snapshot and dependencies.
/// One instance corresponds to one "tab".
pub struct CartStore<A, C, S> {
    inner: Arc<StoreInner<A, C, S>>,
}

impl<A, C, S> Clone for CartStore<A, C, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct StoreInner<A, C, S> {
    tab: TabId,
    api: A,
    catalog: C,
    storage: S,
    bus: SignalBus,
    identity: watch::Receiver<Identity>,
    snapshot: RwLock<Cart>,
}

impl<A, C, S> CartStore<A, C, S>
where
    A: CartApi,
    C: ProductCatalog,
    S: KeyValueStore,
{
    /// Create a store with an empty snapshot. Call [`Self::bootstrap`] to
    /// load the initial cart for the current authority mode.
    pub fn new(
        api: A,
        catalog: C,
        storage: S,
        bus: SignalBus,
        identity: watch::Receiver<Identity>,
    ) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                tab: TabId::generate(),
                api,
                catalog,
                storage,
                bus,
                identity,
                snapshot: RwLock::new(Cart::empty()),
            }),
        }
    }

    /// This tab's identity (used to ignore its own cross-tab signals).
    #[must_use]
    pub fn tab(&self) -> TabId {
        self.inner.tab
    }

    /// Whether the store is currently in server-authoritative mode.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.identity.borrow().is_some()
    }

    /// Clone of the current cart snapshot.
    pub async fn snapshot(&self) -> Cart {
        self.inner.snapshot.read().await.clone()
    }

    /// Load the initial snapshot: the persisted guest record while
    /// anonymous, the server cart while authenticated.
    ///
    /// # Errors
    ///
    /// Returns an error when the authenticated fetch fails. Anonymous
    /// startup never fails: a missing or corrupt guest record starts empty.
    #[instrument(skip(self))]
    pub async fn bootstrap(&self) -> Result<(), CartError> {
        let cart = if self.is_authenticated() {
            self.inner.api.fetch_cart().await?
        } else {
            self.load_guest_record().unwrap_or_else(Cart::empty)
        };
        *self.inner.snapshot.write().await = cart;
        Ok(())
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add `quantity` units of (product, size).
    ///
    /// Anonymous: resolves the price through the catalog, increments the
    /// existing line or appends a new one, persists the guest record.
    /// Authenticated: delegates to the Cart API and replaces the snapshot
    /// with its response. Broadcasts a change signal on success in both
    /// modes. Stock limits are a caller concern, not enforced here.
    ///
    /// # Errors
    ///
    /// `InvalidQuantity` for zero, `ProductNotFound` when the catalog
    /// cannot resolve the product, or any API failure. The prior snapshot
    /// is left intact on failure.
    #[instrument(skip(self), fields(product = %product, size = %size))]
    pub async fn add_item(
        &self,
        product: ProductRef,
        quantity: u32,
        size: &str,
    ) -> Result<Cart, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }

        let cart = if self.is_authenticated() {
            self.inner.api.add_line(&product, quantity, size).await?
        } else {
            let unit_price = self.inner.catalog.product(&product).await?.price;
            let mut cart = self.inner.snapshot.read().await.clone();
            cart.upsert(product, size.to_string(), quantity, unit_price);
            self.persist_guest_record(&cart);
            cart
        };

        *self.inner.snapshot.write().await = cart.clone();
        self.publish_change();
        Ok(cart)
    }

    /// Replace the quantity of the matching line.
    ///
    /// A stale (product, size) reference is a silent no-op: nothing is
    /// persisted, nothing broadcast, no new line created.
    ///
    /// # Errors
    ///
    /// `InvalidQuantity` for zero (use [`Self::remove_item`]), or any API
    /// failure while authenticated.
    #[instrument(skip(self), fields(product = %product, size = %size))]
    pub async fn update_quantity(
        &self,
        product: &ProductRef,
        size: &str,
        quantity: u32,
    ) -> Result<Cart, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }

        if self.is_authenticated() {
            let cart = self.inner.api.update_line(product, size, quantity).await?;
            *self.inner.snapshot.write().await = cart.clone();
            self.publish_change();
            return Ok(cart);
        }

        let mut cart = self.inner.snapshot.read().await.clone();
        if !cart.set_quantity(product, size, quantity) {
            debug!("Stale line reference on update; no-op");
            return Ok(cart);
        }
        self.persist_guest_record(&cart);
        *self.inner.snapshot.write().await = cart.clone();
        self.publish_change();
        Ok(cart)
    }

    /// Remove the matching line. Idempotent: removing an absent line
    /// leaves the snapshot unchanged and is not an error.
    ///
    /// # Errors
    ///
    /// Any API failure while authenticated.
    #[instrument(skip(self), fields(product = %product, size = %size))]
    pub async fn remove_item(&self, product: &ProductRef, size: &str) -> Result<Cart, CartError> {
        if self.is_authenticated() {
            let cart = self.inner.api.remove_line(product, size).await?;
            *self.inner.snapshot.write().await = cart.clone();
            self.publish_change();
            return Ok(cart);
        }

        let mut cart = self.inner.snapshot.read().await.clone();
        if !cart.remove(product, size) {
            debug!("Stale line reference on remove; no-op");
            return Ok(cart);
        }
        self.persist_guest_record(&cart);
        *self.inner.snapshot.write().await = cart.clone();
        self.publish_change();
        Ok(cart)
    }

    /// Empty the cart snapshot.
    ///
    /// Anonymous: also deletes the persisted guest record. Authenticated:
    /// purely a local reset used post-checkout - checkout owns server-side
    /// clearing, so no Cart API call and no broadcast happens here.
    #[instrument(skip(self))]
    pub async fn clear(&self) {
        *self.inner.snapshot.write().await = Cart::empty();
        if !self.is_authenticated() {
            self.remove_guest_record();
        }
    }

    /// Re-fetch the server cart and replace the snapshot. Used after a
    /// foreign cross-tab signal while authenticated.
    ///
    /// # Errors
    ///
    /// Any API failure; the prior snapshot is kept.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<Cart, CartError> {
        let cart = self.inner.api.fetch_cart().await?;
        *self.inner.snapshot.write().await = cart.clone();
        Ok(cart)
    }

    // =========================================================================
    // Mode transitions
    // =========================================================================

    /// Anonymous -> authenticated transition.
    ///
    /// Fetches the server cart; if a persisted guest cart with at least one
    /// line exists, replays it sequentially through a [`ReplayQueue`]
    /// (server prices win), clears the guest record - even when lines
    /// failed - and re-fetches the server cart as the snapshot of record.
    /// Broadcasts one change signal when at least one replay add landed.
    ///
    /// Partial failures are reported in the [`MergeReport`], not raised:
    /// login must not block on a cart-merge issue.
    ///
    /// # Errors
    ///
    /// Only the initial server-cart fetch failure propagates. A failed
    /// post-merge re-fetch keeps the pre-replay server cart and still
    /// reports success.
    #[instrument(skip(self))]
    pub async fn sync_after_login(&self) -> Result<MergeReport, CartError> {
        let server_cart = self.inner.api.fetch_cart().await?;

        let Some(guest) = self.load_guest_record().filter(|cart| !cart.is_empty()) else {
            *self.inner.snapshot.write().await = server_cart;
            return Ok(MergeReport::default());
        };

        let report = ReplayQueue::from_cart(&guest).drain(&self.inner.api).await;

        // The merge runs exactly once; the guest record goes away even when
        // lines failed, so a flaky API cannot re-add lines on every login.
        self.remove_guest_record();

        let snapshot = match self.inner.api.fetch_cart().await {
            Ok(cart) => cart,
            Err(fetch_error) => {
                warn!(%fetch_error, "Post-merge re-fetch failed; keeping pre-merge server cart");
                server_cart
            }
        };
        *self.inner.snapshot.write().await = snapshot;

        if report.succeeded() > 0 {
            self.publish_change();
        }
        if !report.is_complete() {
            warn!(
                attempted = report.attempted,
                failed = report.failures.len(),
                "Guest cart merged with failures"
            );
        }

        Ok(report)
    }

    /// Authenticated -> anonymous transition (logout).
    ///
    /// Drops the server snapshot and loads the persisted guest record
    /// (usually empty post-merge). No merge occurs; the server cart stays
    /// intact server-side for the next login.
    #[instrument(skip(self))]
    pub async fn reset_to_anonymous(&self) {
        let cart = self.load_guest_record().unwrap_or_else(Cart::empty);
        *self.inner.snapshot.write().await = cart;
    }

    /// Event loop: drives mode transitions from the auth signal and
    /// refreshes on foreign cross-tab signals while authenticated.
    ///
    /// Spawn this on a clone of the store; it exits when the auth source
    /// or the signal bus is dropped.
    pub async fn run(self) {
        let mut identity = self.inner.identity.clone();
        let mut signals = self.inner.bus.subscribe();

        loop {
            tokio::select! {
                changed = identity.changed() => {
                    if changed.is_err() {
                        break; // auth source dropped
                    }
                    let authenticated = identity.borrow_and_update().is_some();
                    if authenticated {
                        if let Err(sync_error) = self.sync_after_login().await {
                            error!(%sync_error, "Cart sync after login failed");
                        }
                    } else {
                        self.reset_to_anonymous().await;
                    }
                }
                signal = signals.recv() => match signal {
                    Ok(event) => {
                        if event.origin != self.inner.tab && self.is_authenticated() {
                            if let Err(refresh_error) = self.refresh().await {
                                warn!(%refresh_error, "Cross-tab refresh failed");
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Missed events carry no payload worth recovering;
                        // one re-fetch converges on the latest server cart.
                        debug!(skipped, "Signal receiver lagged");
                        if self.is_authenticated() && self.refresh().await.is_err() {
                            warn!("Refresh after lagged signals failed");
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
    }

    // =========================================================================
    // Guest record persistence (failures swallowed: in-memory-only fallback)
    // =========================================================================

    fn load_guest_record(&self) -> Option<Cart> {
        match self.inner.storage.get(keys::GUEST_CART) {
            Ok(Some(raw)) => match serde_json::from_str::<Cart>(&raw) {
                Ok(mut cart) => {
                    cart.sanitize();
                    Some(cart)
                }
                Err(decode_error) => {
                    warn!(%decode_error, "Corrupt guest cart record; starting empty");
                    None
                }
            },
            Ok(None) => None,
            Err(storage_error) => {
                warn!(%storage_error, "Failed to read guest cart record");
                None
            }
        }
    }

    fn persist_guest_record(&self, cart: &Cart) {
        match serde_json::to_string(cart) {
            Ok(raw) => {
                if let Err(storage_error) = self.inner.storage.set(keys::GUEST_CART, &raw) {
                    warn!(%storage_error, "Failed to persist guest cart; continuing in-memory");
                }
            }
            Err(encode_error) => {
                warn!(%encode_error, "Failed to encode guest cart");
            }
        }
    }

    fn remove_guest_record(&self) {
        if let Err(storage_error) = self.inner.storage.remove(keys::GUEST_CART) {
            warn!(%storage_error, "Failed to clear guest cart record");
        }
    }

    fn publish_change(&self) {
        let event = self.inner.bus.publish(self.inner.tab);
        // The sentinel write is what wakes observers outside this process;
        // its value content is irrelevant.
        if let Err(storage_error) = self
            .inner
            .storage
            .set(keys::CART_SIGNAL, &SignalBus::sentinel_value(&event))
        {
            warn!(%storage_error, "Failed to write cart signal sentinel");
        }
    }
}
