//! Network boundaries consumed by the cart store.
//!
//! Two seams: [`CartApi`] for the server-authoritative cart and
//! [`ProductCatalog`] for price resolution during anonymous adds. The
//! store is generic over both so tests can inject in-process fakes;
//! [`HttpCommerceClient`] implements both against the real REST services.

mod http;

pub use http::HttpCommerceClient;

use std::future::Future;

use zella_core::{Cart, Product, ProductRef};

use crate::error::CartError;

/// Client for the server-authoritative cart.
///
/// Every call returns the **full updated cart**, never a delta; the store
/// replaces its snapshot wholesale from these responses.
pub trait CartApi: Send + Sync {
    /// Fetch the current server cart.
    fn fetch_cart(&self) -> impl Future<Output = Result<Cart, CartError>> + Send;

    /// Add `quantity` units of (product, size). The server resolves the
    /// price; any locally cached price is ignored.
    fn add_line(
        &self,
        product: &ProductRef,
        quantity: u32,
        size: &str,
    ) -> impl Future<Output = Result<Cart, CartError>> + Send;

    /// Replace the quantity of the (product, size) line. A stale reference
    /// is a server-side no-op, not an error.
    fn update_line(
        &self,
        product: &ProductRef,
        size: &str,
        quantity: u32,
    ) -> impl Future<Output = Result<Cart, CartError>> + Send;

    /// Remove the (product, size) line. Idempotent.
    fn remove_line(
        &self,
        product: &ProductRef,
        size: &str,
    ) -> impl Future<Output = Result<Cart, CartError>> + Send;
}

/// Product lookup, used only when adding an item while anonymous.
pub trait ProductCatalog: Send + Sync {
    /// Resolve a product record by id. An unresolvable id is a hard
    /// failure ([`CartError::ProductNotFound`]).
    fn product(&self, id: &ProductRef) -> impl Future<Output = Result<Product, CartError>> + Send;
}

// Sibling tabs share one backend through an Arc.

impl<T: CartApi + ?Sized> CartApi for std::sync::Arc<T> {
    fn fetch_cart(&self) -> impl Future<Output = Result<Cart, CartError>> + Send {
        (**self).fetch_cart()
    }

    fn add_line(
        &self,
        product: &ProductRef,
        quantity: u32,
        size: &str,
    ) -> impl Future<Output = Result<Cart, CartError>> + Send {
        (**self).add_line(product, quantity, size)
    }

    fn update_line(
        &self,
        product: &ProductRef,
        size: &str,
        quantity: u32,
    ) -> impl Future<Output = Result<Cart, CartError>> + Send {
        (**self).update_line(product, size, quantity)
    }

    fn remove_line(
        &self,
        product: &ProductRef,
        size: &str,
    ) -> impl Future<Output = Result<Cart, CartError>> + Send {
        (**self).remove_line(product, size)
    }
}

impl<T: ProductCatalog + ?Sized> ProductCatalog for std::sync::Arc<T> {
    fn product(&self, id: &ProductRef) -> impl Future<Output = Result<Product, CartError>> + Send {
        (**self).product(id)
    }
}
