use chrono::Utc;
use sqlx::SqliteConnection;

use crate::db_types::{Role, User};

pub async fn insert_user(
    display_name: &str,
    role: Role,
    auth_token: &str,
    conn: &mut SqliteConnection,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO users (display_name, role, auth_token, created_at) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(display_name)
    .bind(role)
    .bind(auth_token)
    .bind(Utc::now())
    .fetch_one(conn)
    .await
}

pub async fn fetch_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT id, display_name, role, created_at FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(conn)
        .await
}

pub async fn user_by_token(token: &str, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT id, display_name, role, created_at FROM users WHERE auth_token = ?")
        .bind(token)
        .fetch_optional(conn)
        .await
}

pub async fn staff_user_ids(conn: &mut SqliteConnection) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar("SELECT id FROM users WHERE role = 'staff' ORDER BY id ASC").fetch_all(conn).await
}
