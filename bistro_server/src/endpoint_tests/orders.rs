use actix_web::{
    http::StatusCode,
    web::{self, ServiceConfig},
};
use bistro_common::Cents;
use bistro_engine::{
    db_types::{Dish, ItemComposition, Order, OrderStatus, OrderType, Role},
    events::EventProducers,
    pricing::FeeSchedule,
    OrderFlowApi,
    OrderFlowError,
    OrderQueryApi,
};
use chrono::{TimeZone, Utc};
use mockall::predicate::eq;

use crate::{
    endpoint_tests::{
        helpers::{get_request, issue_token, post_request},
        mocks::{MockLifecycleDb, MockOrderManager},
    },
    routes::{CheckoutRoute, MyOrdersRoute, OrderByIdRoute, SearchOrdersRoute, UpdateStatusRoute},
};

fn order_fixture(id: i64, user_id: i64, status: OrderStatus) -> Order {
    Order {
        id,
        user_id,
        total_price: Cents::from(2550),
        status,
        order_type: OrderType::Takeout,
        takeout_time: None,
        payment_method: "cash".to_string(),
        client_message: None,
        restaurant_message: None,
        archived: false,
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 5, 0).unwrap(),
    }
}

const EXPECTED_MY_ORDERS: &str = "[{\"id\":2,\"user_id\":42,\"total_price\":2550,\"status\":1,\"order_type\":\"takeout\",\
\"takeout_time\":null,\"payment_method\":\"cash\",\"client_message\":null,\"restaurant_message\":null,\"archived\":false,\
\"created_at\":\"2024-03-01T12:00:00Z\",\"updated_at\":\"2024-03-01T12:05:00Z\"},\
{\"id\":1,\"user_id\":42,\"total_price\":2550,\"status\":6,\"order_type\":\"takeout\",\"takeout_time\":null,\
\"payment_method\":\"cash\",\"client_message\":null,\"restaurant_message\":null,\"archived\":false,\
\"created_at\":\"2024-03-01T12:00:00Z\",\"updated_at\":\"2024-03-01T12:05:00Z\"}]";

fn configure_my_orders(cfg: &mut ServiceConfig) {
    let mut db = MockOrderManager::new();
    db.expect_orders_for_user()
        .with(eq(42))
        .returning(|uid| Ok(vec![order_fixture(2, uid, OrderStatus::Confirmed), order_fixture(1, uid, OrderStatus::Completed)]));
    cfg.app_data(web::Data::new(OrderQueryApi::new(db))).service(MyOrdersRoute::<MockOrderManager>::new());
}

#[actix_web::test]
async fn fetch_my_orders() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(42, Role::Customer);
    let (status, body) = get_request(&token, "/orders/my", configure_my_orders).await.expect("Request failed");
    assert!(status.is_success());
    assert_eq!(body, EXPECTED_MY_ORDERS);
}

#[actix_web::test]
async fn no_token_is_rejected() {
    let _ = env_logger::try_init().ok();
    let err = get_request("", "/orders/my", configure_my_orders).await.expect_err("Expected a rejection");
    assert_eq!(err, "Auth token invalid or not provided");
}

#[actix_web::test]
async fn tampered_token_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut token = issue_token(42, Role::Customer);
    // Flip a character inside the claims payload. The signature no longer matches.
    let tampered = if token.remove(4) == 'A' { 'B' } else { 'A' };
    token.insert(4, tampered);
    let err = get_request(&token, "/orders/my", configure_my_orders).await.expect_err("Expected a rejection");
    assert!(err.contains("Access token signature is invalid"), "Unexpected error: {err}");
}

fn configure_order_by_id(cfg: &mut ServiceConfig) {
    let mut db = MockOrderManager::new();
    db.expect_order_by_id().with(eq(1)).returning(|id| Ok(Some(order_fixture(id, 42, OrderStatus::Confirmed))));
    db.expect_items_for_order().returning(|_| Ok(vec![]));
    db.expect_history_for_order().returning(|_| Ok(vec![]));
    cfg.app_data(web::Data::new(OrderQueryApi::new(db))).service(OrderByIdRoute::<MockOrderManager>::new());
}

#[actix_web::test]
async fn customers_cannot_read_other_users_orders() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(7, Role::Customer);
    let (status, body) = get_request(&token, "/orders/1", configure_order_by_id).await.expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"error":"Insufficient Permissions. Order 1 belongs to another user"}"#);
}

#[actix_web::test]
async fn staff_can_read_any_order() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(99, Role::Staff);
    let (status, body) = get_request(&token, "/orders/1", configure_order_by_id).await.expect("Request failed");
    assert!(status.is_success());
    assert!(body.contains(r#""user_id":42"#), "Unexpected body: {body}");
    assert!(body.contains(r#""items":[]"#), "Unexpected body: {body}");
    assert!(body.contains(r#""history":[]"#), "Unexpected body: {body}");
}

fn configure_search(cfg: &mut ServiceConfig) {
    let mut db = MockOrderManager::new();
    db.expect_search_orders().returning(|filter| {
        assert_eq!(filter.statuses, vec![OrderStatus::Confirmed]);
        assert_eq!(filter.archived, Some(false));
        Ok(vec![order_fixture(2, 42, OrderStatus::Confirmed)])
    });
    cfg.app_data(web::Data::new(OrderQueryApi::new(db))).service(SearchOrdersRoute::<MockOrderManager>::new());
}

#[actix_web::test]
async fn staff_can_search_orders() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(99, Role::Staff);
    let (status, body) = get_request(&token, "/orders?status=1&archived=false", configure_search).await.expect("Request failed");
    assert!(status.is_success());
    assert!(body.starts_with(r#"[{"id":2,"user_id":42"#), "Unexpected body: {body}");
}

#[actix_web::test]
async fn customers_cannot_search_orders() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(42, Role::Customer);
    let err = get_request(&token, "/orders?status=1", configure_search).await.expect_err("Expected a rejection");
    assert_eq!(err, "Insufficient permissions");
}

#[actix_web::test]
async fn search_rejects_unknown_status_codes() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(99, Role::Staff);
    let (status, body) = get_request(&token, "/orders?status=99", configure_search).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Could not read request body: Invalid status code: 99"}"#);
}

fn configure_update_status(cfg: &mut ServiceConfig) {
    let mut db = MockLifecycleDb::new();
    db.expect_update_order_status()
        .withf(|id, status, notes| *id == 1 && *status == OrderStatus::InPreparation && *notes == Some("Prépa dans 20 min"))
        .returning(|id, status, _| {
            let mut order = order_fixture(id, 42, status);
            order.restaurant_message = Some("Prépa dans 20 min".to_string());
            Ok(order)
        });
    db.expect_fetch_order().returning(|id| Ok(Some(order_fixture(id, 42, OrderStatus::InPreparation))));
    db.expect_insert_notification().returning(|n| {
        Ok(bistro_engine::db_types::Notification {
            id: 1,
            user_id: n.user_id,
            kind: n.kind,
            title: n.title,
            message: n.message,
            data: sqlx::types::Json(n.data),
            is_read: false,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 10, 0).unwrap(),
        })
    });
    let api = OrderFlowApi::new(db, FeeSchedule::default(), EventProducers::default());
    cfg.app_data(web::Data::new(api)).service(UpdateStatusRoute::<MockLifecycleDb>::new());
}

#[actix_web::test]
async fn staff_can_update_order_status() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(99, Role::Staff);
    let body = serde_json::json!({ "status": 2, "notes": "Prépa dans 20 min" });
    let (status, body) = post_request(&token, "/orders/1/status", body, configure_update_status).await.expect("Request failed");
    assert!(status.is_success());
    assert!(body.contains(r#""status":2"#), "Unexpected body: {body}");
}

#[actix_web::test]
async fn status_updates_reject_unknown_codes() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(99, Role::Staff);
    let body = serde_json::json!({ "status": 99 });
    let (status, body) =
        post_request(&token, "/orders/1/status", body, configure_update_status).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Could not read request body: Invalid status code: 99"}"#);
}

fn configure_checkout(cfg: &mut ServiceConfig) {
    let mut db = MockLifecycleDb::new();
    db.expect_fetch_dish().with(eq(1)).returning(|id| {
        Ok(Some((Dish { id, name: "Tacos".to_string(), price: Cents::from(900), sauce_included: false }, vec![])))
    });
    db.expect_insert_full_order().returning(|order, _, total| {
        let mut created = order_fixture(7, order.user_id, OrderStatus::AwaitingConfirmation);
        created.total_price = total;
        Ok(created)
    });
    db.expect_staff_user_ids().returning(|| Ok(vec![99]));
    // The order row has already committed by the time admin notifications persist; a failure here
    // must not surface as a checkout error, or a retrying client would order twice.
    db.expect_insert_notification().returning(|_| Err(OrderFlowError::Database(sqlx::Error::PoolClosed.to_string())));
    let api = OrderFlowApi::new(db, FeeSchedule::default(), EventProducers::default());
    cfg.app_data(web::Data::new(api)).service(CheckoutRoute::<MockLifecycleDb>::new());
}

#[actix_web::test]
async fn checkout_succeeds_even_when_staff_notifications_fail() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(42, Role::Customer);
    let body = serde_json::json!({ "order_type": "takeout", "items": [ItemComposition::dish(1, 2)] });
    let (status, body) = post_request(&token, "/orders", body, configure_checkout).await.expect("Request failed");
    assert_eq!(status, StatusCode::CREATED);
    assert!(body.contains(r#""id":7"#), "Unexpected body: {body}");
    assert!(body.contains(r#""total_price":1800"#), "Unexpected body: {body}");
}
