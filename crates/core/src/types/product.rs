//! Catalog product record.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductRef;

/// A product as returned by the Catalog API.
///
/// Only the fields the cart engine needs: the current price (resolved when
/// adding a line while anonymous) and the stock level, which the engine
/// exposes to callers but does not itself enforce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductRef,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub stock: Option<u32>,
}
