use chrono::Utc;
use sqlx::SqliteConnection;

use crate::db_types::{ChatMessage, NewChatMessage};

const COLUMNS: &str = "id, order_id, sender_id, sender_type, message, created_at";

pub async fn order_owner(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar("SELECT user_id FROM orders WHERE id = ?").bind(order_id).fetch_optional(conn).await
}

pub async fn insert_chat_message(
    message: NewChatMessage,
    conn: &mut SqliteConnection,
) -> Result<ChatMessage, sqlx::Error> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO chat_messages (order_id, sender_id, sender_type, message, created_at) VALUES (?, ?, ?, ?, ?) \
         RETURNING id",
    )
    .bind(message.order_id)
    .bind(message.sender_id)
    .bind(message.sender_type)
    .bind(&message.message)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await?;
    sqlx::query_as::<_, ChatMessage>(&format!("SELECT {COLUMNS} FROM chat_messages WHERE id = ?"))
        .bind(id)
        .fetch_one(conn)
        .await
}

pub async fn chat_messages_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<ChatMessage>, sqlx::Error> {
    sqlx::query_as::<_, ChatMessage>(&format!(
        "SELECT {COLUMNS} FROM chat_messages WHERE order_id = ? ORDER BY created_at ASC, id ASC"
    ))
    .bind(order_id)
    .fetch_all(conn)
    .await
}
