//! Cart and cart line types shared by the engine and its callers.
//!
//! A [`Cart`] is a value type: every mutating method recomputes
//! `total_amount` before returning, so a cart at rest always satisfies
//! `total_amount == Σ(unit_price × quantity)`. The engine never sets the
//! total independently.
//!
//! The serde representation matches both the Cart API wire format and the
//! persisted guest record: camelCase fields, line price named `price`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductRef;

/// A single cart line, keyed by (product, size).
///
/// `unit_price` is captured when the line is first added and never
/// re-resolved; catalog price changes do not retroactively reprice a line
/// until it is removed and re-added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Opaque product reference.
    pub product: ProductRef,
    /// Variant selector (e.g., "M", "XL").
    pub size: String,
    /// Always >= 1 for a line at rest.
    pub quantity: u32,
    /// Price per unit at time of add.
    #[serde(rename = "price")]
    pub unit_price: Decimal,
}

impl CartItem {
    /// Line total: `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    /// Whether this line is keyed by the given (product, size) pair.
    #[must_use]
    pub fn matches(&self, product: &ProductRef, size: &str) -> bool {
        &self.product == product && self.size == size
    }
}

/// A cart snapshot: ordered lines plus a derived total.
///
/// Line order is insertion order; it is preserved through persistence but
/// carries no correctness meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub total_amount: Decimal,
}

impl Default for Cart {
    fn default() -> Self {
        Self::empty()
    }
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_amount: Decimal::ZERO,
        }
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Find the line for a (product, size) pair, if present.
    #[must_use]
    pub fn line(&self, product: &ProductRef, size: &str) -> Option<&CartItem> {
        self.items.iter().find(|item| item.matches(product, size))
    }

    /// Recompute `total_amount` from the lines.
    pub fn recompute_total(&mut self) {
        self.total_amount = self.items.iter().map(CartItem::line_total).sum();
    }

    /// Add `quantity` units of (product, size) at `unit_price`.
    ///
    /// Increments the existing line if one matches, otherwise appends a new
    /// line, preserving the invariant that no two lines share a
    /// (product, size) pair. An existing line keeps its original
    /// `unit_price`.
    pub fn upsert(&mut self, product: ProductRef, size: String, quantity: u32, unit_price: Decimal) {
        if let Some(item) = self
            .items
            .iter_mut()
            .find(|item| item.matches(&product, &size))
        {
            item.quantity += quantity;
        } else {
            self.items.push(CartItem {
                product,
                size,
                quantity,
                unit_price,
            });
        }
        self.recompute_total();
    }

    /// Replace the quantity of the matching line.
    ///
    /// Returns `false` (and leaves the cart untouched) when no line matches;
    /// a stale reference is not an error and must not create a new line.
    pub fn set_quantity(&mut self, product: &ProductRef, size: &str, quantity: u32) -> bool {
        let Some(item) = self
            .items
            .iter_mut()
            .find(|item| item.matches(product, size))
        else {
            return false;
        };
        item.quantity = quantity;
        self.recompute_total();
        true
    }

    /// Remove the matching line. Idempotent: returns `false` when absent.
    pub fn remove(&mut self, product: &ProductRef, size: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| !item.matches(product, size));
        if self.items.len() == before {
            return false;
        }
        self.recompute_total();
        true
    }

    /// Drop lines that cannot exist at rest (zero quantity) and recompute
    /// the total. Used when re-hydrating a persisted record that may have
    /// been written by an older or concurrent writer.
    pub fn sanitize(&mut self) {
        self.items.retain(|item| item.quantity >= 1);
        self.recompute_total();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn price(units: i64) -> Decimal {
        Decimal::from(units)
    }

    fn cart_with_line(product: &str, size: &str, quantity: u32, unit_price: i64) -> Cart {
        let mut cart = Cart::empty();
        cart.upsert(
            ProductRef::new(product),
            size.to_string(),
            quantity,
            price(unit_price),
        );
        cart
    }

    #[test]
    fn test_upsert_increments_existing_line() {
        // Existing (P1, M) x2 @ 500; adding one more unit yields quantity 3,
        // total 1500.
        let mut cart = cart_with_line("P1", "M", 2, 500);
        cart.upsert(ProductRef::new("P1"), "M".to_string(), 1, price(500));

        assert_eq!(cart.items.len(), 1);
        let line = cart.line(&ProductRef::new("P1"), "M").unwrap();
        assert_eq!(line.quantity, 3);
        assert_eq!(cart.total_amount, price(1500));
    }

    #[test]
    fn test_upsert_keeps_original_unit_price() {
        let mut cart = cart_with_line("P1", "M", 1, 500);
        cart.upsert(ProductRef::new("P1"), "M".to_string(), 1, price(999));

        let line = cart.line(&ProductRef::new("P1"), "M").unwrap();
        assert_eq!(line.unit_price, price(500));
        assert_eq!(cart.total_amount, price(1000));
    }

    #[test]
    fn test_same_product_different_size_is_a_new_line() {
        let mut cart = cart_with_line("P1", "M", 1, 500);
        cart.upsert(ProductRef::new("P1"), "L".to_string(), 1, price(500));

        assert_eq!(cart.items.len(), 2);
        // No two lines share a (product, size) pair
        let mut keys: Vec<_> = cart
            .items
            .iter()
            .map(|item| (item.product.as_str(), item.size.as_str()))
            .collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), cart.items.len());
    }

    #[test]
    fn test_set_quantity_absent_line_is_noop() {
        let mut cart = cart_with_line("P1", "M", 2, 500);
        let snapshot = cart.clone();

        assert!(!cart.set_quantity(&ProductRef::new("P2"), "L", 5));
        assert_eq!(cart, snapshot);
    }

    #[test]
    fn test_set_quantity_recomputes_total() {
        let mut cart = cart_with_line("P1", "M", 2, 500);
        assert!(cart.set_quantity(&ProductRef::new("P1"), "M", 5));
        assert_eq!(cart.total_amount, price(2500));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut cart = cart_with_line("P1", "M", 2, 500);
        let snapshot = cart.clone();

        assert!(!cart.remove(&ProductRef::new("P9"), "M"));
        assert_eq!(cart, snapshot);

        assert!(cart.remove(&ProductRef::new("P1"), "M"));
        assert!(cart.is_empty());
        assert_eq!(cart.total_amount, Decimal::ZERO);

        assert!(!cart.remove(&ProductRef::new("P1"), "M"));
    }

    #[test]
    fn test_total_is_sum_of_line_totals() {
        let mut cart = cart_with_line("P1", "M", 2, 500);
        cart.upsert(ProductRef::new("P2"), "S".to_string(), 3, price(250));

        let expected: Decimal = cart.items.iter().map(CartItem::line_total).sum();
        assert_eq!(cart.total_amount, expected);
        assert_eq!(cart.total_amount, price(1750));
        assert_eq!(cart.total_quantity(), 5);
    }

    #[test]
    fn test_sanitize_drops_zero_quantity_lines() {
        let mut cart = cart_with_line("P1", "M", 2, 500);
        cart.items.push(CartItem {
            product: ProductRef::new("P2"),
            size: "L".to_string(),
            quantity: 0,
            unit_price: price(100),
        });

        cart.sanitize();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.total_amount, price(1000));
    }

    #[test]
    fn test_serde_round_trip_preserves_order_and_total() {
        let mut cart = cart_with_line("P1", "M", 2, 500);
        cart.upsert(ProductRef::new("P2"), "S".to_string(), 1, price(250));

        let json = serde_json::to_string(&cart).unwrap();
        let restored: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, cart);
    }

    #[test]
    fn test_wire_field_names() {
        let cart = cart_with_line("P1", "M", 2, 500);
        let json = serde_json::to_value(&cart).unwrap();

        assert!(json.get("totalAmount").is_some());
        let line = json.get("items").unwrap().get(0).unwrap();
        assert!(line.get("price").is_some());
        assert!(line.get("product").is_some());
    }
}
