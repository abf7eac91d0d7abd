//! Integration tests for the Zella cart engine.
//!
//! The engine is exercised end to end against in-process fakes:
//! [`FakeCartApi`] stands in for the Cart API (with per-product failure
//! injection), [`FakeCatalog`] for the Product Catalog, and sibling "tabs"
//! share one `MemoryStore` and one `SignalBus` the way browser tabs share
//! an origin.
//!
//! # Test Categories
//!
//! - `cart_store` - mutation semantics and invariants in both modes
//! - `merge_protocol` - the anonymous -> authenticated replay
//! - `cross_tab` - change signaling between sibling tabs
//! - `persistence` - guest record round-trips and corruption handling

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rust_decimal::Decimal;
use zella_cart::{
    AuthChannel, CartApi, CartError, CartStore, MemoryStore, ProductCatalog, SignalBus,
};
use zella_core::{Cart, Product, ProductRef, UserId};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process stand-in for the Cart API.
///
/// Holds one server cart, resolves line prices from its own price table
/// (so tests can observe that server prices win over locally captured
/// ones), and can be told to fail adds for specific products or the next
/// fetch.
#[derive(Default)]
pub struct FakeCartApi {
    state: Mutex<Cart>,
    prices: Mutex<HashMap<ProductRef, Decimal>>,
    add_failures: Mutex<HashSet<ProductRef>>,
    fetch_failure: Mutex<bool>,
}

impl FakeCartApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server-side price for a product (default: 100).
    pub fn set_price(&self, product: ProductRef, price: Decimal) {
        lock(&self.prices).insert(product, price);
    }

    /// Make every `add_line` for this product fail with a 503.
    pub fn fail_adds_for(&self, product: ProductRef) {
        lock(&self.add_failures).insert(product);
    }

    /// Make the next `fetch_cart` fail with a 503.
    pub fn fail_next_fetch(&self) {
        *lock(&self.fetch_failure) = true;
    }

    /// Current server cart, for assertions.
    #[must_use]
    pub fn server_cart(&self) -> Cart {
        lock(&self.state).clone()
    }

    fn price_of(&self, product: &ProductRef) -> Decimal {
        lock(&self.prices)
            .get(product)
            .copied()
            .unwrap_or_else(|| Decimal::from(100))
    }

    fn simulated(message: &str) -> CartError {
        CartError::Api {
            status: 503,
            message: message.to_string(),
        }
    }
}

impl CartApi for FakeCartApi {
    async fn fetch_cart(&self) -> Result<Cart, CartError> {
        if std::mem::take(&mut *lock(&self.fetch_failure)) {
            return Err(Self::simulated("simulated fetch failure"));
        }
        Ok(self.server_cart())
    }

    async fn add_line(
        &self,
        product: &ProductRef,
        quantity: u32,
        size: &str,
    ) -> Result<Cart, CartError> {
        if lock(&self.add_failures).contains(product) {
            return Err(Self::simulated("simulated add failure"));
        }
        let price = self.price_of(product);
        let mut cart = lock(&self.state);
        cart.upsert(product.clone(), size.to_string(), quantity, price);
        Ok(cart.clone())
    }

    async fn update_line(
        &self,
        product: &ProductRef,
        size: &str,
        quantity: u32,
    ) -> Result<Cart, CartError> {
        let mut cart = lock(&self.state);
        // Stale references are a server-side no-op, mirroring the real API
        let _ = cart.set_quantity(product, size, quantity);
        Ok(cart.clone())
    }

    async fn remove_line(&self, product: &ProductRef, size: &str) -> Result<Cart, CartError> {
        let mut cart = lock(&self.state);
        let _ = cart.remove(product, size);
        Ok(cart.clone())
    }
}

/// In-process stand-in for the Product Catalog.
pub struct FakeCatalog {
    products: HashMap<ProductRef, Product>,
}

impl FakeCatalog {
    #[must_use]
    pub fn with(products: Vec<Product>) -> Self {
        Self {
            products: products
                .into_iter()
                .map(|product| (product.id.clone(), product))
                .collect(),
        }
    }
}

impl ProductCatalog for FakeCatalog {
    async fn product(&self, id: &ProductRef) -> Result<Product, CartError> {
        self.products
            .get(id)
            .cloned()
            .ok_or_else(|| CartError::ProductNotFound(id.clone()))
    }
}

/// Catalog record helper.
#[must_use]
pub fn product(id: &str, price: i64) -> Product {
    Product {
        id: ProductRef::new(id),
        name: format!("Product {id}"),
        price: Decimal::from(price),
        stock: Some(10),
    }
}

/// Store type used throughout the scenarios.
pub type TestStore = CartStore<Arc<FakeCartApi>, Arc<FakeCatalog>, Arc<MemoryStore>>;

/// One origin: a shared Cart API, catalog, local storage, signal bus, and
/// auth channel. Each [`Self::store`] call opens a new "tab".
pub struct TestContext {
    pub api: Arc<FakeCartApi>,
    pub catalog: Arc<FakeCatalog>,
    pub storage: Arc<MemoryStore>,
    pub bus: SignalBus,
    pub auth: AuthChannel,
}

impl TestContext {
    /// Context starting anonymous, with P1/P2/P3 in the catalog at
    /// 500/250/100.
    #[must_use]
    pub fn new() -> Self {
        Self {
            api: Arc::new(FakeCartApi::new()),
            catalog: Arc::new(FakeCatalog::with(vec![
                product("P1", 500),
                product("P2", 250),
                product("P3", 100),
            ])),
            storage: Arc::new(MemoryStore::new()),
            bus: SignalBus::default(),
            auth: AuthChannel::anonymous(),
        }
    }

    /// Context starting already authenticated.
    #[must_use]
    pub fn authenticated() -> Self {
        Self {
            auth: AuthChannel::authenticated(UserId::new("u-1")),
            ..Self::new()
        }
    }

    /// Open a new tab against this origin.
    #[must_use]
    pub fn store(&self) -> TestStore {
        CartStore::new(
            Arc::clone(&self.api),
            Arc::clone(&self.catalog),
            Arc::clone(&self.storage),
            self.bus.clone(),
            self.auth.subscribe(),
        )
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Poll a store's snapshot until the predicate holds.
///
/// # Panics
///
/// Panics when the condition is not met within two seconds.
pub async fn wait_until(store: &TestStore, predicate: impl Fn(&Cart) -> bool) -> Cart {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let cart = store.snapshot().await;
        if predicate(&cart) {
            return cart;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within deadline; snapshot: {cart:?}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
