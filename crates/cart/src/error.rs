//! Error taxonomy for the cart engine.
//!
//! Mutation failures propagate to the caller as a structured [`CartError`]
//! and leave the prior snapshot intact. Persistence failures never surface
//! here: the store swallows them with a warning and degrades to
//! in-memory-only operation.

use thiserror::Error;
use zella_core::ProductRef;

/// Errors surfaced by cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Cart or Catalog API unreachable (transport failure, after the
    /// client's own connect/timeout retries are exhausted). The store never
    /// retries these itself.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx response from the Cart or Catalog API.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Session expired or token rejected (401).
    #[error("Unauthorized")]
    Unauthorized,

    /// Anonymous-mode add against a product the catalog cannot resolve.
    /// A stale (product, size) on update/remove is a no-op, not an error.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductRef),

    /// Zero quantity passed to add or update.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),

    /// Wire payload could not be decoded.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_error_display() {
        let err = CartError::ProductNotFound(ProductRef::new("prod-42"));
        assert_eq!(err.to_string(), "Product not found: prod-42");

        let err = CartError::Api {
            status: 502,
            message: "upstream unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "API error (502): upstream unavailable");

        let err = CartError::InvalidQuantity(0);
        assert_eq!(err.to_string(), "Invalid quantity: 0");
    }
}
