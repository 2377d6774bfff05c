mod catalog;
mod chat;
mod db;
mod notifications;
mod orders;
mod schema;
mod users;

pub use db::SqliteDatabase;

use std::str::FromStr;

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

/// Opens (creating if necessary) the SQLite database at `url` and applies the schema.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true).foreign_keys(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    schema::apply(&pool).await?;
    Ok(pool)
}
