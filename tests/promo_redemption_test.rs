mod common;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use common::TestApp;
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, PaginatorTrait};
use storefront_api::{
    entities::{Order, Promo},
    errors::{PromoError, ServiceError},
    services::Actor,
};

#[tokio::test]
async fn promo_discounts_order_and_cannot_be_reused() {
    let app = TestApp::new().await;
    let admin = app.seed_user("Admin", true).await;
    let buyer = app.seed_user("Aibek", false).await;
    app.seed_location(buyer.id, "Chui 1").await;
    let tea = app.seed_product("Green Tea", dec!(100.00), 10, 10).await;
    app.seed_promo(admin.id, "SAVE10", 10, dec!(150.00), None).await;

    let first = app.seed_cart_item(buyer.id, tea.id, 2).await;
    let order = app
        .place_order(buyer.id, vec![first], Some("SAVE10"))
        .await
        .unwrap();
    assert_eq!(order.subtotal_amount, dec!(180.00));
    assert_eq!(order.total_amount, dec!(162.00));
    assert_eq!(order.promo_code.as_deref(), Some("SAVE10"));
    assert_eq!(app.services().orders.order_total(&order).await.unwrap(), dec!(162.00));

    let second = app.seed_cart_item(buyer.id, tea.id, 2).await;
    let err = app
        .place_order(buyer.id, vec![second], Some("SAVE10"))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Promo(PromoError::AlreadyUsed(_)));

    // the rejected order reserved nothing
    assert_eq!(app.stock_of(tea.id).await, 8);
    let promo = app.services().promos.lookup("SAVE10").await.unwrap();
    assert_eq!(
        app.services().promos.redeemed_by(promo.id).await.unwrap(),
        vec![buyer.id]
    );
}

#[tokio::test]
async fn total_below_minimum_is_rejected_before_any_write() {
    let app = TestApp::new().await;
    let admin = app.seed_user("Admin", true).await;
    let buyer = app.seed_user("Begimai", false).await;
    app.seed_location(buyer.id, "Chui 2").await;
    let tea = app.seed_product("Black Tea", dec!(50.00), 0, 10).await;
    app.seed_promo(admin.id, "BIG", 20, dec!(150.00), None).await;
    let item = app.seed_cart_item(buyer.id, tea.id, 2).await;

    let err = app
        .place_order(buyer.id, vec![item], Some("BIG"))
        .await
        .unwrap_err();
    assert_matches!(
        err,
        ServiceError::Promo(PromoError::MinimumNotMet { ref code, .. }) if code == "BIG"
    );
    assert_eq!(app.stock_of(tea.id).await, 10);
    assert_eq!(app.services().cart.list_items(buyer.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_and_expired_codes() {
    let app = TestApp::new().await;
    let admin = app.seed_user("Admin", true).await;
    let buyer = app.seed_user("Chyngyz", false).await;
    app.seed_location(buyer.id, "Chui 3").await;
    let tea = app.seed_product("White Tea", dec!(100.00), 0, 10).await;
    let yesterday = Utc::now().date_naive() - Duration::days(1);
    app.seed_promo(admin.id, "OLD", 10, dec!(100.00), Some(yesterday)).await;
    let item = app.seed_cart_item(buyer.id, tea.id, 2).await;

    assert_matches!(
        app.place_order(buyer.id, vec![item], Some("NOPE")).await,
        Err(ServiceError::Promo(PromoError::NotFound(_)))
    );
    assert_matches!(
        app.place_order(buyer.id, vec![item], Some("OLD")).await,
        Err(ServiceError::Promo(PromoError::Expired(_)))
    );
    assert_eq!(app.stock_of(tea.id).await, 10);
}

#[tokio::test]
async fn check_promo_uses_cart_total_and_does_not_redeem() {
    let app = TestApp::new().await;
    let admin = app.seed_user("Admin", true).await;
    let buyer = app.seed_user("Damir", false).await;
    let tea = app.seed_product("Oolong", dec!(100.00), 10, 10).await;
    app.seed_promo(admin.id, "SAVE10", 10, dec!(150.00), None).await;
    app.seed_cart_item(buyer.id, tea.id, 2).await;

    let promos = &app.services().promos;
    let check = promos.check_promo(buyer.id, "SAVE10", None).await.unwrap();
    assert_eq!(check.cart_total, dec!(180.00));
    assert_eq!(check.discounted_total, dec!(162.00));

    let promo = promos.lookup("SAVE10").await.unwrap();
    assert!(promos.redeemed_by(promo.id).await.unwrap().is_empty());

    assert_matches!(
        promos.check_promo(buyer.id, "SAVE10", Some(dec!(120.00))).await,
        Err(ServiceError::Promo(PromoError::MinimumNotMet { .. }))
    );
}

#[tokio::test]
async fn direct_double_redeem_is_already_used() {
    let app = TestApp::new().await;
    let admin = app.seed_user("Admin", true).await;
    let buyer = app.seed_user("Elnura", false).await;
    let promo = app.seed_promo(admin.id, "ONCE", 5, dec!(100.00), None).await;

    let promos = &app.services().promos;
    promos.redeem(&promo, buyer.id).await.unwrap();
    assert_matches!(
        promos.redeem(&promo, buyer.id).await,
        Err(ServiceError::Promo(PromoError::AlreadyUsed(_)))
    );
    assert_eq!(promos.redeemed_by(promo.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn creation_rules_and_expiry() {
    let app = TestApp::new().await;
    let admin = app.seed_user("Admin", true).await;
    let promos = &app.services().promos;
    app.seed_promo(admin.id, "DUP", 10, dec!(100.00), None).await;

    let attempt = |code: &str, discount: i32, min| storefront_api::services::promos::NewPromo {
        code: code.to_string(),
        description: None,
        discount_percent: discount,
        min_qualifying_amount: min,
        expiry_date: None,
    };

    assert_matches!(
        promos.create_promo(admin.id, attempt("DUP", 10, dec!(100.00))).await,
        Err(ServiceError::ValidationError(_))
    );
    assert_matches!(
        promos.create_promo(admin.id, attempt("TOOLONGCODE", 10, dec!(100.00))).await,
        Err(ServiceError::ValidationError(_))
    );
    assert_matches!(
        promos.create_promo(admin.id, attempt("ZERO", 0, dec!(100.00))).await,
        Err(ServiceError::ValidationError(_))
    );
    assert_matches!(
        promos.create_promo(admin.id, attempt("CHEAP", 10, dec!(99.00))).await,
        Err(ServiceError::ValidationError(_))
    );

    let expired = promos.expire_promo("DUP").await.unwrap();
    assert!(expired.is_expired);

    let last_week = Utc::now().date_naive() - Duration::days(7);
    app.seed_promo(admin.id, "STALE", 10, dec!(100.00), Some(last_week)).await;
    app.seed_promo(admin.id, "FRESH", 10, dec!(100.00), None).await;
    assert_eq!(promos.expire_overdue(Utc::now().date_naive()).await.unwrap(), 1);
    assert!(promos.lookup("STALE").await.unwrap().is_expired);
    assert!(!promos.lookup("FRESH").await.unwrap().is_expired);
}

#[tokio::test]
async fn racing_orders_redeem_a_promo_once() {
    let app = TestApp::new_shared().await;
    let admin = app.seed_user("Admin", true).await;
    let buyer = app.seed_user("Farida", false).await;
    app.seed_location(buyer.id, "Chui 4").await;
    let tea = app.seed_product("Puer", dec!(100.00), 0, 10).await;
    let honey = app.seed_product("Honey", dec!(100.00), 0, 10).await;
    app.seed_promo(admin.id, "SAVE10", 10, dec!(150.00), None).await;
    let tea_item = app.seed_cart_item(buyer.id, tea.id, 2).await;
    let honey_item = app.seed_cart_item(buyer.id, honey.id, 2).await;

    let (a, b) = tokio::join!(
        app.place_order(buyer.id, vec![tea_item], Some("SAVE10")),
        app.place_order(buyer.id, vec![honey_item], Some("SAVE10")),
    );

    assert_eq!([&a, &b].iter().filter(|r| r.is_ok()).count(), 1);
    let rejected = [&a, &b]
        .into_iter()
        .find_map(|r| r.as_ref().err())
        .expect("one order rejected");
    // an interleaved loser may be stopped by the database lock instead
    assert_matches!(
        rejected,
        ServiceError::Promo(PromoError::AlreadyUsed(_)) | ServiceError::DatabaseError(_)
    );

    let placed = a.as_ref().or(b.as_ref()).expect("one order placed");
    assert_eq!(placed.total_amount, dec!(180.00));
    let (won, lost) = if a.is_ok() { (tea.id, honey.id) } else { (honey.id, tea.id) };
    assert_eq!(app.stock_of(won).await, 8);
    assert_eq!(app.stock_of(lost).await, 10);
    assert_eq!(Order::find().count(app.db()).await.unwrap(), 1);

    let promo = app.services().promos.lookup("SAVE10").await.unwrap();
    assert_eq!(
        app.services().promos.redeemed_by(promo.id).await.unwrap(),
        vec![buyer.id]
    );
}

#[tokio::test]
async fn order_total_falls_back_when_promo_is_gone() {
    let app = TestApp::new().await;
    let admin = app.seed_user("Admin", true).await;
    let buyer = app.seed_user("Gulnara", false).await;
    app.seed_location(buyer.id, "Chui 5").await;
    let tea = app.seed_product("Rooibos", dec!(100.00), 10, 10).await;
    let promo = app.seed_promo(admin.id, "SAVE10", 10, dec!(150.00), None).await;
    let item = app.seed_cart_item(buyer.id, tea.id, 2).await;

    let order = app
        .place_order(buyer.id, vec![item], Some("SAVE10"))
        .await
        .unwrap();
    assert_eq!(app.services().orders.order_total(&order).await.unwrap(), dec!(162.00));

    Promo::delete_by_id(promo.id).exec(app.db()).await.unwrap();

    let orders = &app.services().orders;
    assert_eq!(orders.order_total(&order).await.unwrap(), dec!(180.00));
    let stored = orders
        .get_order(Actor::superuser(admin.id), order.id)
        .await
        .unwrap();
    assert_eq!(stored.total_amount, dec!(162.00));
    assert_eq!(stored.promo_code.as_deref(), Some("SAVE10"));
}

#[tokio::test]
async fn codes_are_matched_without_surrounding_whitespace() {
    let app = TestApp::new().await;
    let admin = app.seed_user("Admin", true).await;
    let buyer = app.seed_user("Nurlan", false).await;
    app.seed_location(buyer.id, "Chui 6").await;
    let tea = app.seed_product("Matcha", dec!(100.00), 10, 10).await;
    app.seed_promo(admin.id, " SAVE10 ", 10, dec!(150.00), None).await;

    let promos = &app.services().promos;
    assert_eq!(promos.lookup(" SAVE10 ").await.unwrap().code, "SAVE10");

    let item = app.seed_cart_item(buyer.id, tea.id, 2).await;
    let order = app
        .place_order(buyer.id, vec![item], Some(" SAVE10"))
        .await
        .unwrap();
    assert_eq!(order.total_amount, dec!(162.00));
    assert_eq!(order.promo_code.as_deref(), Some("SAVE10"));
}
