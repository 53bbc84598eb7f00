mod common;

use assert_matches::assert_matches;
use common::TestApp;
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, PaginatorTrait};
use storefront_api::{
    entities::{order::OrderStatus, Order},
    errors::ServiceError,
    services::{pricing, Actor},
};
use uuid::Uuid;

#[tokio::test]
async fn discounted_line_becomes_order_total() {
    let app = TestApp::new().await;
    let buyer = app.seed_user("Aziza", false).await;
    app.seed_location(buyer.id, "Chui 120").await;
    let tea = app.seed_product("Green Tea", dec!(100.00), 10, 5).await;
    let item = app.seed_cart_item(buyer.id, tea.id, 2).await;

    let lines = app.services().cart.list_items(buyer.id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].line_amount, dec!(180.00));

    let order = app.place_order(buyer.id, vec![item], None).await.unwrap();

    assert_eq!(order.status, OrderStatus::Preparing);
    assert_eq!(order.total_amount, dec!(180.00));
    assert_eq!(order.subtotal_amount, dec!(180.00));
    assert_eq!(order.location_snapshot.address.as_deref(), Some("Chui 120"));
    assert_eq!(order.items_snapshot.lines().len(), 1);
    assert!(order.courier_id.is_none());
    assert!(order.assigned_at.is_none());
    assert!(order.delivered_at.is_none());
    assert_eq!(app.stock_of(tea.id).await, 3);

    let recomputed = pricing::order_total(&order.items_snapshot, None);
    assert!((recomputed - order.total_amount).abs() <= dec!(0.01));

    // ordered rows leave the cart
    assert!(app.services().cart.list_items(buyer.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_item_id_changes_nothing() {
    let app = TestApp::new().await;
    let buyer = app.seed_user("Bakyt", false).await;
    app.seed_location(buyer.id, "Toktogul 8").await;
    let rice = app.seed_product("Rice", dec!(12.50), 0, 10).await;
    let item = app.seed_cart_item(buyer.id, rice.id, 4).await;

    let err = app
        .place_order(buyer.id, vec![item, Uuid::new_v4()], None)
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::NotFound(_));
    assert_eq!(app.stock_of(rice.id).await, 10);
    assert_eq!(Order::find().count(app.db()).await.unwrap(), 0);
    assert_eq!(app.services().cart.list_items(buyer.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn someone_elses_cart_item_is_not_found() {
    let app = TestApp::new().await;
    let owner = app.seed_user("Owner", false).await;
    let other = app.seed_user("Other", false).await;
    app.seed_location(other.id, "Ibraimova 3").await;
    let salt = app.seed_product("Salt", dec!(1.50), 0, 10).await;
    let item = app.seed_cart_item(owner.id, salt.id, 1).await;

    let err = app.place_order(other.id, vec![item], None).await.unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn empty_item_list_is_rejected() {
    let app = TestApp::new().await;
    let buyer = app.seed_user("Cholpon", false).await;
    app.seed_location(buyer.id, "Manas 40").await;

    let err = app.place_order(buyer.id, vec![], None).await.unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn order_without_any_location_is_rejected() {
    let app = TestApp::new().await;
    let buyer = app.seed_user("Dinara", false).await;
    let milk = app.seed_product("Milk", dec!(2.25), 0, 10).await;
    let item = app.seed_cart_item(buyer.id, milk.id, 1).await;

    let err = app.place_order(buyer.id, vec![item], None).await.unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
    assert_eq!(app.stock_of(milk.id).await, 10);
}

#[tokio::test]
async fn insufficient_stock_rolls_back_and_names_product() {
    let app = TestApp::new().await;
    let buyer = app.seed_user("Emil", false).await;
    app.seed_location(buyer.id, "Kievskaya 77").await;
    let honey = app.seed_product("Honey", dec!(8.00), 0, 1).await;
    let bread = app.seed_product("Bread", dec!(0.75), 0, 10).await;
    let honey_item = app.seed_cart_item(buyer.id, honey.id, 2).await;
    let bread_item = app.seed_cart_item(buyer.id, bread.id, 3).await;

    let err = app
        .place_order(buyer.id, vec![bread_item, honey_item], None)
        .await
        .unwrap_err();

    assert_matches!(
        err,
        ServiceError::InsufficientStock { ref product, available: 1 } if product == "Honey"
    );
    assert_eq!(app.stock_of(bread.id).await, 10);
    assert_eq!(app.stock_of(honey.id).await, 1);
}

#[tokio::test]
async fn assigning_twice_stamps_assigned_at_once() {
    let app = TestApp::new().await;
    let admin = app.seed_user("Admin", true).await;
    let buyer = app.seed_user("Farida", false).await;
    app.seed_location(buyer.id, "Frunze 1").await;
    let first = app.seed_courier(app.seed_user("Courier A", false).await.id, None).await;
    let second = app.seed_courier(app.seed_user("Courier B", false).await.id, None).await;
    let cake = app.seed_product("Cake", dec!(20.00), 0, 3).await;
    let item = app.seed_cart_item(buyer.id, cake.id, 1).await;
    let order = app.place_order(buyer.id, vec![item], None).await.unwrap();

    let orders = &app.services().orders;
    let assigned = orders
        .assign_courier(Actor::superuser(admin.id), order.id, first.id)
        .await
        .unwrap();
    assert_eq!(assigned.status, OrderStatus::OutForDelivery);
    let stamped = assigned.assigned_at.expect("assigned_at stamped");

    let reassigned = orders
        .assign_courier(Actor::superuser(admin.id), order.id, second.id)
        .await
        .unwrap();
    assert_eq!(reassigned.courier_id, Some(second.id));
    assert_eq!(reassigned.assigned_at, Some(stamped));
    assert_eq!(reassigned.status, OrderStatus::OutForDelivery);
}

#[tokio::test]
async fn delivery_stamps_once_and_is_terminal() {
    let app = TestApp::new().await;
    let admin = app.seed_user("Admin", true).await;
    let buyer = app.seed_user("Gulnara", false).await;
    app.seed_location(buyer.id, "Sovetskaya 5").await;
    let cheese = app.seed_product("Cheese", dec!(6.50), 0, 4).await;
    let item = app.seed_cart_item(buyer.id, cheese.id, 2).await;
    let order = app.place_order(buyer.id, vec![item], None).await.unwrap();

    let orders = &app.services().orders;
    let delivered = orders
        .set_delivered(Actor::superuser(admin.id), order.id)
        .await
        .unwrap();
    assert_eq!(delivered.status, OrderStatus::Delivered);
    let stamped = delivered.delivered_at.expect("delivered_at stamped");

    let again = orders
        .set_delivered(Actor::superuser(admin.id), order.id)
        .await
        .unwrap();
    assert_eq!(again.delivered_at, Some(stamped));

    let err = orders
        .set_status(Actor::superuser(admin.id), order.id, OrderStatus::Preparing)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidOperation(_));

    // assigning after delivery never moves the order backwards
    let courier = app.seed_courier(app.seed_user("Late", false).await.id, None).await;
    let late = orders
        .assign_courier(Actor::superuser(admin.id), order.id, courier.id)
        .await
        .unwrap();
    assert_eq!(late.status, OrderStatus::Delivered);
}

#[tokio::test]
async fn only_the_assigned_courier_may_deliver() {
    let app = TestApp::new().await;
    let admin = app.seed_user("Admin", true).await;
    let buyer = app.seed_user("Ilyas", false).await;
    app.seed_location(buyer.id, "Moskovskaya 9").await;
    let rider = app.seed_user("Rider", false).await;
    let stranger = app.seed_user("Stranger", false).await;
    let courier = app.seed_courier(rider.id, Some("couriers")).await;
    app.seed_courier(stranger.id, Some("couriers")).await;
    let juice = app.seed_product("Juice", dec!(3.00), 0, 5).await;
    let item = app.seed_cart_item(buyer.id, juice.id, 1).await;
    let order = app.place_order(buyer.id, vec![item], None).await.unwrap();

    let orders = &app.services().orders;
    orders
        .assign_courier(Actor::superuser(admin.id), order.id, courier.id)
        .await
        .unwrap();

    let err = orders
        .set_delivered(Actor::user(stranger.id), order.id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));

    let err = orders
        .set_delivered(Actor::user(buyer.id), order.id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));

    let delivered = orders
        .set_delivered(Actor::user(rider.id), order.id)
        .await
        .unwrap();
    assert_eq!(delivered.status, OrderStatus::Delivered);

    // the assigned courier can read the order, others cannot
    assert!(orders.get_order(Actor::user(rider.id), order.id).await.is_ok());
    assert_matches!(
        orders.get_order(Actor::user(stranger.id), order.id).await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn non_admin_cannot_assign_or_set_status() {
    let app = TestApp::new().await;
    let buyer = app.seed_user("Jyldyz", false).await;
    app.seed_location(buyer.id, "Isanova 2").await;
    let courier = app.seed_courier(app.seed_user("Rider", false).await.id, None).await;
    let pear = app.seed_product("Pear", dec!(0.50), 0, 9).await;
    let item = app.seed_cart_item(buyer.id, pear.id, 3).await;
    let order = app.place_order(buyer.id, vec![item], None).await.unwrap();

    let orders = &app.services().orders;
    assert_matches!(
        orders.assign_courier(Actor::user(buyer.id), order.id, courier.id).await,
        Err(ServiceError::Forbidden(_))
    );
    assert_matches!(
        orders
            .set_status(Actor::user(buyer.id), order.id, OrderStatus::Delivered)
            .await,
        Err(ServiceError::Forbidden(_))
    );
}

#[tokio::test]
async fn delete_is_scoped_to_owner() {
    let app = TestApp::new().await;
    let buyer = app.seed_user("Kanat", false).await;
    let other = app.seed_user("Lira", false).await;
    app.seed_location(buyer.id, "Abdrakhmanova 50").await;
    let soap = app.seed_product("Soap", dec!(1.25), 0, 10).await;
    let item = app.seed_cart_item(buyer.id, soap.id, 2).await;
    let order = app.place_order(buyer.id, vec![item], None).await.unwrap();

    let orders = &app.services().orders;
    assert_matches!(
        orders.delete_order(Actor::user(other.id), order.id).await,
        Err(ServiceError::NotFound(_))
    );

    orders.delete_order(Actor::user(buyer.id), order.id).await.unwrap();
    assert_matches!(
        orders.get_order(Actor::user(buyer.id), order.id).await,
        Err(ServiceError::NotFound(_))
    );
    // stock is not restored
    assert_eq!(app.stock_of(soap.id).await, 8);
}

#[tokio::test]
async fn explicit_location_must_belong_to_user() {
    let app = TestApp::new().await;
    let buyer = app.seed_user("Meerim", false).await;
    let other = app.seed_user("Nurlan", false).await;
    app.seed_location(buyer.id, "Own street").await;
    let foreign = app.seed_location(other.id, "Foreign street").await;
    let kiwi = app.seed_product("Kiwi", dec!(0.25), 0, 10).await;
    let item = app.seed_cart_item(buyer.id, kiwi.id, 4).await;

    let err = app
        .services()
        .orders
        .create_order(storefront_api::commands::orders::CreateOrderCommand {
            user_id: buyer.id,
            item_ids: vec![item],
            promo_code: None,
            location_id: Some(foreign.id),
            file_attachment: Some("invoice.pdf".into()),
        })
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::NotFound(_));
    assert_eq!(app.stock_of(kiwi.id).await, 10);
}
