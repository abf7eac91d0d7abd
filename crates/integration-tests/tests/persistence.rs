//! Guest record round-trips, wire shape, and corruption handling.

use zella_cart::{KeyValueStore, keys};
use zella_core::ProductRef;
use zella_integration_tests::TestContext;

#[tokio::test]
async fn test_guest_record_wire_shape() {
    let ctx = TestContext::new();
    let store = ctx.store();
    store.bootstrap().await.expect("bootstrap");
    store
        .add_item(ProductRef::new("P1"), 2, "M")
        .await
        .expect("add");

    let raw = ctx
        .storage
        .get(keys::GUEST_CART)
        .expect("get")
        .expect("record present");
    let value: serde_json::Value = serde_json::from_str(&raw).expect("valid json");

    // Amounts travel as strings; field names are camelCase.
    assert_eq!(value["totalAmount"], "1000");
    let line = &value["items"][0];
    assert_eq!(line["product"], "P1");
    assert_eq!(line["size"], "M");
    assert_eq!(line["quantity"], 2);
    assert_eq!(line["price"], "500");
}

#[tokio::test]
async fn test_corrupt_guest_record_bootstraps_empty() {
    let ctx = TestContext::new();
    ctx.storage
        .set(keys::GUEST_CART, "{not json")
        .expect("seed corrupt record");

    let store = ctx.store();
    store.bootstrap().await.expect("bootstrap");
    assert!(store.snapshot().await.is_empty());

    // A subsequent add overwrites the corrupt record with a valid one.
    store
        .add_item(ProductRef::new("P1"), 1, "M")
        .await
        .expect("add");
    let raw = ctx
        .storage
        .get(keys::GUEST_CART)
        .expect("get")
        .expect("record present");
    assert!(serde_json::from_str::<serde_json::Value>(&raw).is_ok());
}

#[tokio::test]
async fn test_zero_quantity_lines_are_dropped_on_load() {
    let ctx = TestContext::new();
    let record = serde_json::json!({
        "items": [
            { "product": "P1", "size": "M", "quantity": 0, "price": "500" },
            { "product": "P2", "size": "L", "quantity": 2, "price": "250" }
        ],
        "totalAmount": "1000"
    });
    ctx.storage
        .set(keys::GUEST_CART, &record.to_string())
        .expect("seed record");

    let store = ctx.store();
    store.bootstrap().await.expect("bootstrap");

    let cart = store.snapshot().await;
    assert_eq!(cart.items.len(), 1);
    assert!(cart.line(&ProductRef::new("P1"), "M").is_none());
    // Total recomputed from the surviving lines
    assert_eq!(cart.total_amount, rust_decimal::Decimal::from(500));
}

#[tokio::test]
async fn test_mutations_keep_record_and_snapshot_in_step() {
    let ctx = TestContext::new();
    let store = ctx.store();
    store.bootstrap().await.expect("bootstrap");

    store
        .add_item(ProductRef::new("P1"), 2, "M")
        .await
        .expect("add");
    store
        .update_quantity(&ProductRef::new("P1"), "M", 5)
        .await
        .expect("update");

    let raw = ctx
        .storage
        .get(keys::GUEST_CART)
        .expect("get")
        .expect("record present");
    let persisted: zella_core::Cart = serde_json::from_str(&raw).expect("decode");
    assert_eq!(persisted, store.snapshot().await);

    store
        .remove_item(&ProductRef::new("P1"), "M")
        .await
        .expect("remove");
    let raw = ctx
        .storage
        .get(keys::GUEST_CART)
        .expect("get")
        .expect("record present");
    let persisted: zella_core::Cart = serde_json::from_str(&raw).expect("decode");
    assert!(persisted.is_empty());
}
