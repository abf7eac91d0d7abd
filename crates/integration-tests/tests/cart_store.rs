//! Mutation semantics and invariants of the cart store in both modes.

use rust_decimal::Decimal;
use zella_cart::{CartError, KeyValueStore, keys};
use zella_core::{CartItem, ProductRef};
use zella_integration_tests::TestContext;

fn amount(units: i64) -> Decimal {
    Decimal::from(units)
}

// =============================================================================
// Anonymous mode
// =============================================================================

#[tokio::test]
async fn test_anonymous_add_increments_existing_line() {
    // Existing (P1, M) x2 @ 500; adding one more unit yields quantity 3,
    // total 1500.
    let ctx = TestContext::new();
    let store = ctx.store();
    store.bootstrap().await.expect("bootstrap");

    store
        .add_item(ProductRef::new("P1"), 2, "M")
        .await
        .expect("first add");
    let cart = store
        .add_item(ProductRef::new("P1"), 1, "M")
        .await
        .expect("second add");

    assert_eq!(cart.items.len(), 1);
    let line = cart.line(&ProductRef::new("P1"), "M").expect("line");
    assert_eq!(line.quantity, 3);
    assert_eq!(line.unit_price, amount(500));
    assert_eq!(cart.total_amount, amount(1500));
}

#[tokio::test]
async fn test_anonymous_add_resolves_price_from_catalog() {
    let ctx = TestContext::new();
    let store = ctx.store();
    store.bootstrap().await.expect("bootstrap");

    let cart = store
        .add_item(ProductRef::new("P2"), 3, "S")
        .await
        .expect("add");

    let line = cart.line(&ProductRef::new("P2"), "S").expect("line");
    assert_eq!(line.unit_price, amount(250));
    assert_eq!(cart.total_amount, amount(750));
}

#[tokio::test]
async fn test_add_unknown_product_is_hard_failure() {
    let ctx = TestContext::new();
    let store = ctx.store();
    store.bootstrap().await.expect("bootstrap");

    store
        .add_item(ProductRef::new("P1"), 1, "M")
        .await
        .expect("add");
    let before = store.snapshot().await;

    let result = store.add_item(ProductRef::new("nope"), 1, "M").await;
    assert!(matches!(result, Err(CartError::ProductNotFound(_))));

    // Prior snapshot left intact
    assert_eq!(store.snapshot().await, before);
}

#[tokio::test]
async fn test_add_rejects_zero_quantity() {
    let ctx = TestContext::new();
    let store = ctx.store();
    store.bootstrap().await.expect("bootstrap");

    let result = store.add_item(ProductRef::new("P1"), 0, "M").await;
    assert!(matches!(result, Err(CartError::InvalidQuantity(0))));
}

#[tokio::test]
async fn test_update_absent_line_is_noop() {
    // updateQuantity("P2", "L", 5) when no (P2, L) line exists: cart
    // unchanged, no new line created.
    let ctx = TestContext::new();
    let store = ctx.store();
    store.bootstrap().await.expect("bootstrap");

    store
        .add_item(ProductRef::new("P1"), 2, "M")
        .await
        .expect("add");
    let before = store.snapshot().await;

    let cart = store
        .update_quantity(&ProductRef::new("P2"), "L", 5)
        .await
        .expect("update");

    assert_eq!(cart, before);
    assert_eq!(store.snapshot().await, before);
}

#[tokio::test]
async fn test_remove_is_idempotent() {
    let ctx = TestContext::new();
    let store = ctx.store();
    store.bootstrap().await.expect("bootstrap");

    store
        .add_item(ProductRef::new("P1"), 2, "M")
        .await
        .expect("add");
    let before = store.snapshot().await;

    let cart = store
        .remove_item(&ProductRef::new("P1"), "L")
        .await
        .expect("remove absent size");
    assert_eq!(cart, before);

    let cart = store
        .remove_item(&ProductRef::new("P1"), "M")
        .await
        .expect("remove");
    assert!(cart.is_empty());

    let cart = store
        .remove_item(&ProductRef::new("P1"), "M")
        .await
        .expect("remove again");
    assert!(cart.is_empty());
}

#[tokio::test]
async fn test_total_invariant_across_mixed_operations() {
    let ctx = TestContext::new();
    let store = ctx.store();
    store.bootstrap().await.expect("bootstrap");

    store
        .add_item(ProductRef::new("P1"), 2, "M")
        .await
        .expect("add P1");
    store
        .add_item(ProductRef::new("P2"), 1, "L")
        .await
        .expect("add P2");
    store
        .update_quantity(&ProductRef::new("P2"), "L", 4)
        .await
        .expect("update");
    let cart = store
        .remove_item(&ProductRef::new("P1"), "M")
        .await
        .expect("remove");

    let expected: Decimal = cart.items.iter().map(CartItem::line_total).sum();
    assert_eq!(cart.total_amount, expected);
    assert_eq!(cart.total_amount, amount(1000));
}

#[tokio::test]
async fn test_anonymous_clear_deletes_guest_record() {
    let ctx = TestContext::new();
    let store = ctx.store();
    store.bootstrap().await.expect("bootstrap");

    store
        .add_item(ProductRef::new("P1"), 1, "M")
        .await
        .expect("add");
    assert!(ctx.storage.get(keys::GUEST_CART).expect("get").is_some());

    store.clear().await;
    assert!(store.snapshot().await.is_empty());
    assert!(ctx.storage.get(keys::GUEST_CART).expect("get").is_none());
}

// =============================================================================
// Server-authoritative mode
// =============================================================================

#[tokio::test]
async fn test_authenticated_add_delegates_and_replaces_snapshot() {
    let ctx = TestContext::authenticated();
    ctx.api
        .set_price(ProductRef::new("P1"), Decimal::from(450));
    let store = ctx.store();
    store.bootstrap().await.expect("bootstrap");

    let cart = store
        .add_item(ProductRef::new("P1"), 2, "M")
        .await
        .expect("add");

    // Snapshot is the server's response: server price, not catalog price
    let line = cart.line(&ProductRef::new("P1"), "M").expect("line");
    assert_eq!(line.unit_price, amount(450));
    assert_eq!(ctx.api.server_cart(), cart);

    // The mutation broadcast wrote the sentinel key
    assert!(ctx.storage.get(keys::CART_SIGNAL).expect("get").is_some());
}

#[tokio::test]
async fn test_authenticated_clear_is_local_only() {
    let ctx = TestContext::authenticated();
    let store = ctx.store();
    store.bootstrap().await.expect("bootstrap");

    store
        .add_item(ProductRef::new("P1"), 2, "M")
        .await
        .expect("add");
    store.clear().await;

    // Post-checkout reset: local snapshot empty, server cart untouched
    assert!(store.snapshot().await.is_empty());
    assert_eq!(ctx.api.server_cart().total_quantity(), 2);
}

#[tokio::test]
async fn test_authenticated_mutation_failure_keeps_snapshot() {
    let ctx = TestContext::authenticated();
    let store = ctx.store();
    store.bootstrap().await.expect("bootstrap");

    store
        .add_item(ProductRef::new("P1"), 1, "M")
        .await
        .expect("add");
    let before = store.snapshot().await;

    ctx.api.fail_adds_for(ProductRef::new("P2"));
    let result = store.add_item(ProductRef::new("P2"), 1, "M").await;
    assert!(matches!(result, Err(CartError::Api { status: 503, .. })));
    assert_eq!(store.snapshot().await, before);
}

// =============================================================================
// Persistence degradation
// =============================================================================

#[tokio::test]
async fn test_guest_record_survives_across_stores() {
    // Same storage, fresh store: simulates a page reload.
    let ctx = TestContext::new();
    let first = ctx.store();
    first.bootstrap().await.expect("bootstrap");
    first
        .add_item(ProductRef::new("P1"), 2, "M")
        .await
        .expect("add");
    let persisted = first.snapshot().await;

    let second = ctx.store();
    second.bootstrap().await.expect("bootstrap");
    assert_eq!(second.snapshot().await, persisted);
}

#[tokio::test]
async fn test_fresh_storage_starts_empty() {
    let ctx = TestContext::new();
    let store = ctx.store();
    store.bootstrap().await.expect("bootstrap");
    assert!(store.snapshot().await.is_empty());
}
