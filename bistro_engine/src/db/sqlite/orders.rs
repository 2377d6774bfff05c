use bistro_common::Cents;
use chrono::Utc;
use log::trace;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    api::order_objects::{OrderItemView, OrderQueryFilter},
    db_types::{NewOrder, Order, OrderItem, OrderItemExtra, OrderStatus, OrderedItem, StatusHistoryEntry},
    pricing::PricedItem,
};

const ORDER_COLUMNS: &str = "id, user_id, total_price, status, order_type, takeout_time, payment_method, \
                             client_message, restaurant_message, archived, created_at, updated_at";

const ITEM_COLUMNS: &str =
    "id, order_id, dish_id, sauce_id, modifier_sauce_id, version_size, quantity, unit_price, total_price, is_ready, \
     message";

pub async fn fetch_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"))
        .bind(order_id)
        .fetch_optional(conn)
        .await
}

/// Inserts the order row, all item rows with their extra/removed-ingredient associations, and the
/// initial status-history entry. Not atomic on its own: the caller wraps this in a transaction.
pub async fn insert_full_order(
    order: &NewOrder,
    items: &[PricedItem],
    total: Cents,
    conn: &mut SqliteConnection,
) -> Result<i64, sqlx::Error> {
    let now = Utc::now();
    let order_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO orders (user_id, total_price, status, order_type, takeout_time, payment_method,
                            client_message, archived, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(order.user_id)
    .bind(total)
    .bind(OrderStatus::AwaitingConfirmation)
    .bind(order.order_type)
    .bind(order.takeout_time)
    .bind(&order.payment_method)
    .bind(&order.client_message)
    .bind(order.archived)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;
    for priced in items {
        let (dish_id, sauce_id) = match priced.composition.item {
            OrderedItem::Dish(id) => (Some(id), None),
            OrderedItem::Sauce(id) => (None, Some(id)),
        };
        let item_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO order_items (order_id, dish_id, sauce_id, modifier_sauce_id, version_size,
                                     quantity, unit_price, total_price, is_ready, message)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, ?)
            RETURNING id
            "#,
        )
        .bind(order_id)
        .bind(dish_id)
        .bind(sauce_id)
        .bind(priced.composition.sauce_id)
        .bind(&priced.resolved_version)
        .bind(priced.composition.quantity)
        .bind(priced.unit_price)
        .bind(priced.total_price)
        .bind(&priced.composition.message)
        .fetch_one(&mut *conn)
        .await?;
        for (extra_id, price) in &priced.extra_prices {
            sqlx::query("INSERT INTO order_item_extras (order_item_id, extra_id, price) VALUES (?, ?, ?)")
                .bind(item_id)
                .bind(extra_id)
                .bind(price)
                .execute(&mut *conn)
                .await?;
        }
        for ingredient_id in &priced.composition.removed_ingredient_ids {
            sqlx::query(
                "INSERT INTO order_item_removed_ingredients (order_item_id, ingredient_id) VALUES (?, ?)",
            )
            .bind(item_id)
            .bind(ingredient_id)
            .execute(&mut *conn)
            .await?;
        }
    }
    append_history(order_id, OrderStatus::AwaitingConfirmation.label(), None, &mut *conn).await?;
    Ok(order_id)
}

pub async fn append_history(
    order_id: i64,
    status_label: &str,
    notes: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO status_history (order_id, status_label, notes, created_at) VALUES (?, ?, ?, ?)")
        .bind(order_id)
        .bind(status_label)
        .bind(notes)
        .bind(Utc::now())
        .execute(conn)
        .await?;
    Ok(())
}

/// Updates the status (and the restaurant message, when notes are given) and appends the history
/// entry. The caller wraps this in a transaction.
pub async fn update_status(
    order_id: i64,
    status: OrderStatus,
    notes: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE orders SET status = ?, restaurant_message = COALESCE(?, restaurant_message), updated_at = ? WHERE id \
         = ?",
    )
    .bind(status)
    .bind(notes)
    .bind(Utc::now())
    .bind(order_id)
    .execute(&mut *conn)
    .await?;
    append_history(order_id, status.label(), notes, conn).await
}

pub async fn set_item_ready(
    order_id: i64,
    item_id: i64,
    is_ready: bool,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderItem>, sqlx::Error> {
    let result = sqlx::query("UPDATE order_items SET is_ready = ? WHERE id = ? AND order_id = ?")
        .bind(is_ready)
        .bind(item_id)
        .bind(order_id)
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Ok(None);
    }
    sqlx::query_as::<_, OrderItem>(&format!("SELECT {ITEM_COLUMNS} FROM order_items WHERE id = ?"))
        .bind(item_id)
        .fetch_optional(conn)
        .await
}

pub async fn set_archived(
    order_id: i64,
    archived: bool,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let result = sqlx::query("UPDATE orders SET archived = ?, updated_at = ? WHERE id = ?")
        .bind(archived)
        .bind(Utc::now())
        .bind(order_id)
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Ok(None);
    }
    fetch_order(order_id, conn).await
}

pub async fn items_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItemView>, sqlx::Error> {
    let items = sqlx::query_as::<_, OrderItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ? ORDER BY id ASC"
    ))
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;
    let mut views = Vec::with_capacity(items.len());
    for item in items {
        let extras = sqlx::query_as::<_, OrderItemExtra>(
            "SELECT extra_id, price FROM order_item_extras WHERE order_item_id = ? ORDER BY id ASC",
        )
        .bind(item.id)
        .fetch_all(&mut *conn)
        .await?;
        let removed_ingredient_ids: Vec<i64> = sqlx::query_scalar(
            "SELECT ingredient_id FROM order_item_removed_ingredients WHERE order_item_id = ? ORDER BY id ASC",
        )
        .bind(item.id)
        .fetch_all(&mut *conn)
        .await?;
        views.push(OrderItemView { item, extras, removed_ingredient_ids });
    }
    Ok(views)
}

pub async fn history_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<StatusHistoryEntry>, sqlx::Error> {
    sqlx::query_as::<_, StatusHistoryEntry>(
        "SELECT id, order_id, status_label, notes, created_at FROM status_history WHERE order_id = ? ORDER BY id ASC",
    )
    .bind(order_id)
    .fetch_all(conn)
    .await
}

pub async fn orders_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ? ORDER BY created_at DESC, id DESC"
    ))
    .bind(user_id)
    .fetch_all(conn)
    .await
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`.
///
/// Resulting orders are most recent first.
pub async fn search_orders(filter: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!("SELECT {ORDER_COLUMNS} FROM orders "));
    if !filter.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(user_id) = filter.user_id {
        where_clause.push("user_id = ");
        where_clause.push_bind_unseparated(user_id);
    }
    if let Some(archived) = filter.archived {
        where_clause.push("archived = ");
        where_clause.push_bind_unseparated(archived);
    }
    if let Some(order_type) = filter.order_type {
        where_clause.push("order_type = ");
        where_clause.push_bind_unseparated(order_type);
    }
    if !filter.statuses.is_empty() {
        let codes = filter.statuses.iter().map(|s| s.code().to_string()).collect::<Vec<_>>().join(",");
        where_clause.push(format!("status IN ({codes})"));
    }
    builder.push(" ORDER BY created_at DESC, id DESC");
    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🗃️ Result of search_orders: {} rows", orders.len());
    Ok(orders)
}
