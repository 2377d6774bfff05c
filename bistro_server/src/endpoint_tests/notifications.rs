use actix_web::{
    http::StatusCode,
    web::{self, ServiceConfig},
};
use bistro_engine::{
    db_types::{Notification, NotificationData, NotificationType, Role},
    NotificationApi,
    DEFAULT_NOTIFICATION_LIMIT,
};
use chrono::{TimeZone, Utc};
use mockall::predicate::eq;
use sqlx::types::Json;

use crate::{
    endpoint_tests::{
        helpers::{delete_request, get_request, issue_token, post_request},
        mocks::MockNotificationManager,
    },
    routes::{
        ClearNotificationsRoute,
        DeleteNotificationRoute,
        MarkAllNotificationsReadRoute,
        MarkNotificationReadRoute,
        MyNotificationsRoute,
    },
};

fn notification_fixture(id: i64, user_id: i64) -> Notification {
    Notification {
        id,
        user_id,
        kind: NotificationType::OrderStatus,
        title: format!("Commande #{id}"),
        message: "Confirmée".to_string(),
        data: Json(NotificationData {
            order_id: Some(id),
            status: Some(1),
            status_text: Some("Confirmée".to_string()),
            notes: None,
        }),
        is_read: false,
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
    }
}

const EXPECTED_FEED: &str = "{\"notifications\":[{\"id\":5,\"user_id\":42,\"kind\":\"order_status\",\
\"title\":\"Commande #5\",\"message\":\"Confirmée\",\"data\":{\"order_id\":5,\"status\":1,\
\"status_text\":\"Confirmée\",\"notes\":null},\"is_read\":false,\"created_at\":\"2024-03-01T12:00:00Z\"}],\
\"unread\":3}";

fn configure_feed(cfg: &mut ServiceConfig) {
    let mut db = MockNotificationManager::new();
    db.expect_notifications_for_user()
        .with(eq(42), eq(DEFAULT_NOTIFICATION_LIMIT))
        .returning(|uid, _| Ok(vec![notification_fixture(5, uid)]));
    db.expect_unread_count().with(eq(42)).returning(|_| Ok(3));
    cfg.app_data(web::Data::new(NotificationApi::new(db))).service(MyNotificationsRoute::<MockNotificationManager>::new());
}

#[actix_web::test]
async fn fetch_notification_feed() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(42, Role::Customer);
    let (status, body) = get_request(&token, "/notifications", configure_feed).await.expect("Request failed");
    assert!(status.is_success());
    assert_eq!(body, EXPECTED_FEED);
}

#[actix_web::test]
async fn notification_limit_is_clamped() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut db = MockNotificationManager::new();
        // A silly limit gets clamped before it reaches the storage layer.
        db.expect_notifications_for_user().with(eq(42), eq(200)).returning(|_, _| Ok(vec![]));
        db.expect_unread_count().returning(|_| Ok(0));
        cfg.app_data(web::Data::new(NotificationApi::new(db)))
            .service(MyNotificationsRoute::<MockNotificationManager>::new());
    }
    let token = issue_token(42, Role::Customer);
    let (status, _) = get_request(&token, "/notifications?limit=5000", configure).await.expect("Request failed");
    assert!(status.is_success());
}

fn configure_mark_read(cfg: &mut ServiceConfig) {
    let mut db = MockNotificationManager::new();
    db.expect_mark_as_read().with(eq(42), eq(5)).returning(|_, _| Ok(true));
    db.expect_mark_as_read().with(eq(42), eq(999)).returning(|_, _| Ok(false));
    cfg.app_data(web::Data::new(NotificationApi::new(db)))
        .service(MarkNotificationReadRoute::<MockNotificationManager>::new());
}

#[actix_web::test]
async fn mark_notification_read() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(42, Role::Customer);
    let (status, body) =
        post_request(&token, "/notifications/5/read", serde_json::json!({}), configure_mark_read).await.expect("Request failed");
    assert!(status.is_success());
    assert_eq!(body, "{\"success\":true,\"message\":\"Notification 5 marked as read\"}");
}

#[actix_web::test]
async fn marking_a_missing_notification_is_a_404() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(42, Role::Customer);
    let (status, body) = post_request(&token, "/notifications/999/read", serde_json::json!({}), configure_mark_read)
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Notification 999"}"#);
}

#[actix_web::test]
async fn mark_all_notifications_read() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut db = MockNotificationManager::new();
        db.expect_mark_all_read().with(eq(42)).returning(|_| Ok(7));
        cfg.app_data(web::Data::new(NotificationApi::new(db)))
            .service(MarkAllNotificationsReadRoute::<MockNotificationManager>::new());
    }
    let token = issue_token(42, Role::Customer);
    let (status, body) =
        post_request(&token, "/notifications/read-all", serde_json::json!({}), configure).await.expect("Request failed");
    assert!(status.is_success());
    assert_eq!(body, "{\"success\":true,\"message\":\"7 notifications marked as read\"}");
}

#[actix_web::test]
async fn delete_a_notification() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut db = MockNotificationManager::new();
        db.expect_delete_notification().with(eq(42), eq(5)).returning(|_, _| Ok(true));
        cfg.app_data(web::Data::new(NotificationApi::new(db)))
            .service(DeleteNotificationRoute::<MockNotificationManager>::new());
    }
    let token = issue_token(42, Role::Customer);
    let (status, body) = delete_request(&token, "/notifications/5", configure).await.expect("Request failed");
    assert!(status.is_success());
    assert_eq!(body, "{\"success\":true,\"message\":\"Notification 5 deleted\"}");
}

#[actix_web::test]
async fn clear_all_notifications() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut db = MockNotificationManager::new();
        db.expect_delete_all().with(eq(42)).returning(|_| Ok(4));
        cfg.app_data(web::Data::new(NotificationApi::new(db)))
            .service(ClearNotificationsRoute::<MockNotificationManager>::new());
    }
    let token = issue_token(42, Role::Customer);
    let (status, body) = delete_request(&token, "/notifications", configure).await.expect("Request failed");
    assert!(status.is_success());
    assert_eq!(body, "{\"success\":true,\"message\":\"4 notifications deleted\"}");
}
