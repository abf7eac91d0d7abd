//! Core types for the Zella cart engine.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod id;
pub mod product;

pub use cart::{Cart, CartItem};
pub use id::*;
pub use product::Product;
