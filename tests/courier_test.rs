mod common;

use assert_matches::assert_matches;
use common::TestApp;
use rust_decimal_macros::dec;
use storefront_api::{errors::ServiceError, services::Actor};
use uuid::Uuid;

#[tokio::test]
async fn creating_a_courier_grants_staff_and_group() {
    let app = TestApp::new().await;
    let user = app.seed_user("Rider", false).await;
    assert!(!user.is_staff);

    let courier = app.seed_courier(user.id, Some("riders")).await;
    assert_eq!(courier.user_id, user.id);
    assert_eq!(courier.group_role.as_deref(), Some("riders"));

    let reloaded = app.services().accounts.get_user(user.id).await.unwrap();
    assert!(reloaded.is_staff);
    assert!(reloaded.is_active);
    assert_eq!(
        app.services().accounts.groups(user.id).await.unwrap(),
        vec!["riders".to_string()]
    );
}

#[tokio::test]
async fn group_set_is_replaced_not_merged() {
    let app = TestApp::new().await;
    let user = app.seed_user("Switcher", false).await;
    let courier = app.seed_courier(user.id, Some("day")).await;
    let couriers = &app.services().couriers;

    let moved = couriers
        .update_courier(courier.id, None, Some("night".into()))
        .await
        .unwrap();
    assert_eq!(moved.group_role.as_deref(), Some("night"));
    assert_eq!(moved.phone, courier.phone);
    assert_eq!(
        app.services().accounts.groups(user.id).await.unwrap(),
        vec!["night".to_string()]
    );

    couriers.update_courier(courier.id, None, None).await.unwrap();
    assert!(app.services().accounts.groups(user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn courier_without_group_has_no_groups() {
    let app = TestApp::new().await;
    let user = app.seed_user("Loner", false).await;
    let courier = app.seed_courier(user.id, None).await;

    assert!(courier.group_role.is_none());
    assert!(app.services().accounts.groups(user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn creation_errors() {
    let app = TestApp::new().await;
    let user = app.seed_user("Twice", false).await;
    app.seed_courier(user.id, None).await;
    let couriers = &app.services().couriers;

    assert_matches!(
        couriers
            .create_courier(user.id, "+99655500001".into(), None)
            .await,
        Err(ServiceError::ValidationError(_))
    );
    assert_matches!(
        couriers
            .create_courier(Uuid::new_v4(), "+99655500002".into(), None)
            .await,
        Err(ServiceError::NotFound(_))
    );
    let other = app.seed_user("LongPhone", false).await;
    assert_matches!(
        couriers
            .create_courier(other.id, "+9965550000023".into(), None)
            .await,
        Err(ServiceError::ValidationError(_))
    );
    assert_matches!(
        couriers.update_courier(Uuid::new_v4(), None, None).await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn assigned_orders_follow_the_courier() {
    let app = TestApp::new().await;
    let admin = app.seed_user("Admin", true).await;
    let buyer = app.seed_user("Buyer", false).await;
    let rider = app.seed_user("Rider", false).await;
    app.seed_location(buyer.id, "Manas 12").await;
    let bread = app.seed_product("Bread", dec!(1.50), 0, 10).await;
    let courier = app.seed_courier(rider.id, Some("riders")).await;

    let first = app.seed_cart_item(buyer.id, bread.id, 1).await;
    let first = app.place_order(buyer.id, vec![first], None).await.unwrap();
    let second = app.seed_cart_item(buyer.id, bread.id, 2).await;
    let second = app.place_order(buyer.id, vec![second], None).await.unwrap();

    let orders = &app.services().orders;
    orders
        .assign_courier(Actor::superuser(admin.id), first.id, courier.id)
        .await
        .unwrap();

    let assigned = app
        .services()
        .couriers
        .list_assigned_orders(courier.id)
        .await
        .unwrap();
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0].id, first.id);
    assert_ne!(assigned[0].id, second.id);

    let found = app
        .services()
        .couriers
        .find_by_user(rider.id)
        .await
        .unwrap()
        .expect("rider is a courier");
    assert_eq!(found.id, courier.id);
    assert!(app
        .services()
        .couriers
        .find_by_user(buyer.id)
        .await
        .unwrap()
        .is_none());
}
