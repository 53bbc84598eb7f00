mod common;

use assert_matches::assert_matches;
use common::TestApp;
use rust_decimal_macros::dec;
use storefront_api::{errors::ServiceError, services::cart::MAX_ITEM_QUANTITY};
use uuid::Uuid;

#[tokio::test]
async fn adding_same_product_merges_rows() {
    let app = TestApp::new().await;
    let user = app.seed_user("Asel", false).await;
    let apple = app.seed_product("Apple", dec!(0.50), 0, 100).await;
    let cart = &app.services().cart;

    let first = cart.add_item(user.id, apple.id, 2).await.unwrap();
    let merged = cart.add_item(user.id, apple.id, 3).await.unwrap();

    assert_eq!(first.item.id, merged.item.id);
    assert_eq!(merged.item.quantity, 5);
    assert_eq!(merged.line_amount, dec!(2.50));
    assert_eq!(cart.list_items(user.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn totals_are_rounded_per_line() {
    let app = TestApp::new().await;
    let user = app.seed_user("Bermet", false).await;
    let soda = app.seed_product("Soda", dec!(1.25), 10, 100).await;
    let chips = app.seed_product("Chips", dec!(2.00), 25, 100).await;
    let cart = &app.services().cart;
    cart.add_item(user.id, soda.id, 3).await.unwrap();
    cart.add_item(user.id, chips.id, 1).await.unwrap();

    // 1.25 * 0.9 * 3 = 3.375 -> 3.38; 2.00 * 0.75 = 1.50
    assert_eq!(cart.total(user.id).await.unwrap(), dec!(4.88));
}

#[tokio::test]
async fn quantity_and_product_rules() {
    let app = TestApp::new().await;
    let user = app.seed_user("Cholpon", false).await;
    let plum = app.seed_product("Plum", dec!(0.25), 0, 10).await;
    let cart = &app.services().cart;

    assert_matches!(
        cart.add_item(user.id, plum.id, 0).await,
        Err(ServiceError::ValidationError(_))
    );
    assert_matches!(
        cart.add_item(user.id, Uuid::new_v4(), 1).await,
        Err(ServiceError::NotFound(_))
    );

    let line = cart.add_item(user.id, plum.id, 1).await.unwrap();
    let updated = cart.update_quantity(user.id, line.item.id, 4).await.unwrap();
    assert_eq!(updated.item.quantity, 4);
    assert_eq!(updated.line_amount, dec!(1.00));
    assert_matches!(
        cart.update_quantity(user.id, line.item.id, -1).await,
        Err(ServiceError::ValidationError(_))
    );
}

#[tokio::test]
async fn removal_is_scoped_to_owner() {
    let app = TestApp::new().await;
    let owner = app.seed_user("Owner", false).await;
    let intruder = app.seed_user("Intruder", false).await;
    let fig = app.seed_product("Fig", dec!(0.75), 0, 10).await;
    let cart = &app.services().cart;
    let item = app.seed_cart_item(owner.id, fig.id, 1).await;

    assert_matches!(
        cart.remove_item(intruder.id, item).await,
        Err(ServiceError::NotFound(_))
    );
    cart.remove_item(owner.id, item).await.unwrap();
    assert_matches!(
        cart.remove_item(owner.id, item).await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn clear_counts_only_open_rows() {
    let app = TestApp::new().await;
    let user = app.seed_user("Daniyar", false).await;
    app.seed_location(user.id, "Bokonbaeva 4").await;
    let a = app.seed_product("A", dec!(1.00), 0, 10).await;
    let b = app.seed_product("B", dec!(2.00), 0, 10).await;
    let c = app.seed_product("C", dec!(3.00), 0, 10).await;
    let ordered = app.seed_cart_item(user.id, a.id, 1).await;
    app.seed_cart_item(user.id, b.id, 1).await;
    app.seed_cart_item(user.id, c.id, 1).await;
    app.place_order(user.id, vec![ordered], None).await.unwrap();

    assert_eq!(app.services().cart.clear(user.id).await.unwrap(), 2);
    assert!(app.services().cart.list_items(user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn deleted_product_leaves_zero_priced_line() {
    let app = TestApp::new().await;
    let user = app.seed_user("Eldiyar", false).await;
    let gone = app.seed_product("Discontinued", dec!(9.00), 0, 10).await;
    let kept = app.seed_product("Kept", dec!(4.00), 0, 10).await;
    app.seed_cart_item(user.id, gone.id, 2).await;
    app.seed_cart_item(user.id, kept.id, 1).await;

    app.services().catalog.delete_product(gone.id).await.unwrap();

    let lines = app.services().cart.list_items(user.id).await.unwrap();
    assert_eq!(lines.len(), 2);
    let orphan = lines
        .iter()
        .find(|l| l.product.is_none())
        .expect("orphaned row listed");
    assert_eq!(orphan.line_amount, dec!(0));
    assert!(orphan.item.product_id.is_none());
    assert_eq!(app.services().cart.total(user.id).await.unwrap(), dec!(4.00));
}

#[tokio::test]
async fn merged_quantity_cannot_overflow() {
    let app = TestApp::new().await;
    let user = app.seed_user("Greedy", false).await;
    let salt = app.seed_product("Salt", dec!(0.25), 0, 10).await;
    let cart = &app.services().cart;

    assert_matches!(
        cart.add_item(user.id, salt.id, i32::MAX).await,
        Err(ServiceError::ValidationError(_))
    );

    let line = cart
        .add_item(user.id, salt.id, MAX_ITEM_QUANTITY)
        .await
        .unwrap();
    assert_matches!(
        cart.add_item(user.id, salt.id, 1).await,
        Err(ServiceError::ValidationError(_))
    );

    let lines = cart.list_items(user.id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].item.id, line.item.id);
    assert_eq!(lines[0].item.quantity, MAX_ITEM_QUANTITY);
}
