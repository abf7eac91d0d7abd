//! Zella Cart - the shopping-cart consistency engine.
//!
//! Maintains a single logical cart view across two authority sources: an
//! anonymous, locally-persisted guest cart and a server-authoritative cart
//! behind the Cart API. The [`store::CartStore`] owns the in-memory
//! snapshot, persists the anonymous variant through a [`persist::KeyValueStore`],
//! broadcasts cross-tab change signals through a [`signal::SignalBus`], and
//! replays the guest cart into the server cart when the
//! [`auth::AuthChannel`] reports a login.
//!
//! # Authority modes
//!
//! The mode is derived from the auth signal, never stored:
//! - **anonymous** - mutations resolve prices through the Catalog API and
//!   are persisted locally; the guest record survives restarts.
//! - **server-authoritative** - mutations delegate to the Cart API and the
//!   snapshot is replaced wholesale from its responses (never patched).
//!
//! # Example
//!
//! ```rust,ignore
//! use zella_cart::{AuthChannel, CartConfig, CartStore, FileStore, HttpCommerceClient, SignalBus};
//!
//! let config = CartConfig::from_env()?;
//! let client = HttpCommerceClient::new(&config)?;
//! let storage = FileStore::new(&config.storage_dir)?;
//! let auth = AuthChannel::anonymous();
//!
//! let store = CartStore::new(client.clone(), client, storage, SignalBus::default(), auth.subscribe());
//! store.bootstrap().await?;
//! store.add_item("prod-1".into(), 1, "M").await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod merge;
pub mod persist;
pub mod signal;
pub mod store;

pub use api::{CartApi, HttpCommerceClient, ProductCatalog};
pub use auth::{AuthChannel, Identity};
pub use config::{CartConfig, ConfigError};
pub use error::CartError;
pub use merge::{MergeReport, ReplayFailure, ReplayQueue};
pub use persist::{FileStore, KeyValueStore, MemoryStore, StorageError, keys};
pub use signal::{CartChanged, SignalBus, TabId};
pub use store::CartStore;
