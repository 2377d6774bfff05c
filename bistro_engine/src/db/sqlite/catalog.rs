use bistro_common::Cents;
use sqlx::SqliteConnection;

use crate::db_types::{Dish, DishVersion, Extra, Ingredient, Sauce};

pub async fn fetch_dish(
    id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<(Dish, Vec<DishVersion>)>, sqlx::Error> {
    let dish = sqlx::query_as::<_, Dish>("SELECT id, name, price, sauce_included FROM dishes WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    let Some(dish) = dish else { return Ok(None) };
    let versions = sqlx::query_as::<_, DishVersion>(
        "SELECT name, extra_price FROM dish_versions WHERE dish_id = ? ORDER BY position ASC, id ASC",
    )
    .bind(id)
    .fetch_all(conn)
    .await?;
    Ok(Some((dish, versions)))
}

pub async fn fetch_sauce(id: i64, conn: &mut SqliteConnection) -> Result<Option<Sauce>, sqlx::Error> {
    sqlx::query_as::<_, Sauce>("SELECT id, name, price FROM sauces WHERE id = ?").bind(id).fetch_optional(conn).await
}

pub async fn fetch_extra(id: i64, conn: &mut SqliteConnection) -> Result<Option<Extra>, sqlx::Error> {
    sqlx::query_as::<_, Extra>("SELECT id, name, price FROM extras WHERE id = ?").bind(id).fetch_optional(conn).await
}

pub async fn fetch_ingredient(id: i64, conn: &mut SqliteConnection) -> Result<Option<Ingredient>, sqlx::Error> {
    sqlx::query_as::<_, Ingredient>("SELECT id, name FROM ingredients WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn insert_dish(
    name: &str,
    price: Cents,
    sauce_included: bool,
    versions: &[(&str, Cents)],
    conn: &mut SqliteConnection,
) -> Result<i64, sqlx::Error> {
    let dish_id: i64 =
        sqlx::query_scalar("INSERT INTO dishes (name, price, sauce_included) VALUES (?, ?, ?) RETURNING id")
            .bind(name)
            .bind(price)
            .bind(sauce_included)
            .fetch_one(&mut *conn)
            .await?;
    for (position, (version_name, extra_price)) in versions.iter().enumerate() {
        sqlx::query("INSERT INTO dish_versions (dish_id, name, extra_price, position) VALUES (?, ?, ?, ?)")
            .bind(dish_id)
            .bind(version_name)
            .bind(extra_price)
            .bind(position as i64)
            .execute(&mut *conn)
            .await?;
    }
    Ok(dish_id)
}

pub async fn insert_sauce(name: &str, price: Cents, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("INSERT INTO sauces (name, price) VALUES (?, ?) RETURNING id")
        .bind(name)
        .bind(price)
        .fetch_one(conn)
        .await
}

pub async fn insert_extra(name: &str, price: Cents, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("INSERT INTO extras (name, price) VALUES (?, ?) RETURNING id")
        .bind(name)
        .bind(price)
        .fetch_one(conn)
        .await
}

pub async fn insert_ingredient(name: &str, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("INSERT INTO ingredients (name) VALUES (?) RETURNING id").bind(name).fetch_one(conn).await
}
