//! Cart commands against the configured Cart API.
//!
//! # Environment Variables
//!
//! - `CART_API_BASE_URL` - Base URL of the Cart/Catalog API (required)
//! - `CART_API_TOKEN` - Bearer token; presence selects server-authoritative
//!   mode
//! - `CART_STORAGE_DIR` - Local state directory (default: .zella)

use thiserror::Error;
use zella_cart::{
    AuthChannel, CartConfig, CartError, CartStore, ConfigError, FileStore, HttpCommerceClient,
    MergeReport, SignalBus, StorageError,
};
use zella_core::{Cart, ProductRef, UserId};

/// Errors that can occur while running a cart command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Local state directory could not be opened.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// `sync` replays into the server cart and needs credentials.
    #[error("`sync` requires CART_API_TOKEN to be set")]
    TokenRequired,
}

type Store = CartStore<HttpCommerceClient, HttpCommerceClient, FileStore>;

/// Build a store wired to the configured API and local state directory.
/// The auth channel is kept alive for the lifetime of the command.
fn build_store() -> Result<(Store, AuthChannel), CliError> {
    let config = CartConfig::from_env()?;
    let authenticated = config.api_token.is_some();

    let client = HttpCommerceClient::new(&config)?;
    let storage = FileStore::new(&config.storage_dir)?;
    let auth = if authenticated {
        AuthChannel::authenticated(UserId::new("cli"))
    } else {
        AuthChannel::anonymous()
    };

    let store = CartStore::new(
        client.clone(),
        client,
        storage,
        SignalBus::default(),
        auth.subscribe(),
    );
    Ok((store, auth))
}

/// Show the current cart.
///
/// # Errors
///
/// Returns an error when configuration or the authenticated fetch fails.
pub async fn show() -> Result<(), CliError> {
    let (store, _auth) = build_store()?;
    store.bootstrap().await?;
    print_cart(&store.snapshot().await);
    Ok(())
}

/// Add `quantity` units of (product, size).
///
/// # Errors
///
/// Returns an error when the product cannot be resolved or the API call
/// fails.
pub async fn add(product: &str, size: &str, quantity: u32) -> Result<(), CliError> {
    let (store, _auth) = build_store()?;
    store.bootstrap().await?;
    let cart = store
        .add_item(ProductRef::new(product), quantity, size)
        .await?;
    print_cart(&cart);
    Ok(())
}

/// Replace the quantity of the matching line.
///
/// # Errors
///
/// Returns an error when the quantity is zero or the API call fails.
pub async fn update(product: &str, size: &str, quantity: u32) -> Result<(), CliError> {
    let (store, _auth) = build_store()?;
    store.bootstrap().await?;
    let cart = store
        .update_quantity(&ProductRef::new(product), size, quantity)
        .await?;
    print_cart(&cart);
    Ok(())
}

/// Remove the matching line (no-op if absent).
///
/// # Errors
///
/// Returns an error when the API call fails.
pub async fn remove(product: &str, size: &str) -> Result<(), CliError> {
    let (store, _auth) = build_store()?;
    store.bootstrap().await?;
    let cart = store.remove_item(&ProductRef::new(product), size).await?;
    print_cart(&cart);
    Ok(())
}

/// Empty the local cart snapshot. While anonymous this also deletes the
/// guest record; the server cart is never touched.
///
/// # Errors
///
/// Returns an error when configuration fails.
pub async fn clear() -> Result<(), CliError> {
    let (store, _auth) = build_store()?;
    store.bootstrap().await?;
    store.clear().await;
    print_cart(&store.snapshot().await);
    Ok(())
}

/// Replay the local guest cart into the server cart.
///
/// # Errors
///
/// Returns an error when no token is configured or the server cart cannot
/// be fetched. Per-line replay failures are reported, not raised.
pub async fn sync() -> Result<(), CliError> {
    let config = CartConfig::from_env()?;
    if config.api_token.is_none() {
        return Err(CliError::TokenRequired);
    }

    let (store, _auth) = build_store()?;
    let report = store.sync_after_login().await?;
    print_report(&report);
    print_cart(&store.snapshot().await);
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_cart(cart: &Cart) {
    if cart.is_empty() {
        println!("Cart is empty.");
        return;
    }
    for item in &cart.items {
        println!(
            "{:<24} size {:<4} x{:<3} @ {:>10}  = {:>10}",
            item.product,
            item.size,
            item.quantity,
            item.unit_price,
            item.line_total()
        );
    }
    println!(
        "{} item(s), total {}",
        cart.total_quantity(),
        cart.total_amount
    );
}

#[allow(clippy::print_stdout)]
fn print_report(report: &MergeReport) {
    if report.attempted == 0 {
        println!("No guest cart to sync.");
        return;
    }
    println!(
        "Synced {}/{} guest line(s).",
        report.succeeded(),
        report.attempted
    );
    for failure in &report.failures {
        println!(
            "  failed: {} size {} x{} ({})",
            failure.line.product, failure.line.size, failure.line.quantity, failure.error
        );
    }
}
