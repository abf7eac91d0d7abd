//! Zella Core - Shared types library.
//!
//! This crate provides common types used across all Zella cart components:
//! - `cart` - The consistency engine (store, merge protocol, signaling)
//! - `cli` - Command-line tool for exercising a cart against a live API
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no
//! persistence. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype refs, cart and catalog records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
