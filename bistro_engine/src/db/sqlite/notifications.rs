use chrono::Utc;
use sqlx::{types::Json, SqliteConnection};

use crate::db_types::{NewNotification, Notification};

const COLUMNS: &str = "id, user_id, kind, title, message, data, is_read, created_at";

pub async fn insert_notification(
    notification: NewNotification,
    conn: &mut SqliteConnection,
) -> Result<Notification, sqlx::Error> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO notifications (user_id, kind, title, message, data, is_read, created_at)
        VALUES (?, ?, ?, ?, ?, 0, ?)
        RETURNING id
        "#,
    )
    .bind(notification.user_id)
    .bind(notification.kind)
    .bind(&notification.title)
    .bind(&notification.message)
    .bind(Json(&notification.data))
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await?;
    sqlx::query_as::<_, Notification>(&format!("SELECT {COLUMNS} FROM notifications WHERE id = ?"))
        .bind(id)
        .fetch_one(conn)
        .await
}

pub async fn notifications_for_user(
    user_id: i64,
    limit: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Notification>, sqlx::Error> {
    sqlx::query_as::<_, Notification>(&format!(
        "SELECT {COLUMNS} FROM notifications WHERE user_id = ? ORDER BY created_at DESC, id DESC LIMIT ?"
    ))
    .bind(user_id)
    .bind(limit)
    .fetch_all(conn)
    .await
}

pub async fn unread_count(user_id: i64, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = 0")
        .bind(user_id)
        .fetch_one(conn)
        .await
}

pub async fn mark_as_read(
    user_id: i64,
    notification_id: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ? AND user_id = ?")
        .bind(notification_id)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn mark_all_read(user_id: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE user_id = ? AND is_read = 0")
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_notification(
    user_id: i64,
    notification_id: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM notifications WHERE id = ? AND user_id = ?")
        .bind(notification_id)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_all(user_id: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM notifications WHERE user_id = ?").bind(user_id).execute(conn).await?;
    Ok(result.rows_affected())
}
