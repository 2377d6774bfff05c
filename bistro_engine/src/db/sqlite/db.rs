use bistro_common::Cents;
use log::*;
use sqlx::SqlitePool;

use crate::{
    api::order_objects::{OrderItemView, OrderQueryFilter},
    db::sqlite::{catalog, chat, new_pool, notifications, orders, users},
    db_types::{
        ChatMessage,
        Dish,
        DishVersion,
        Extra,
        Ingredient,
        NewChatMessage,
        NewNotification,
        NewOrder,
        Notification,
        Order,
        OrderItem,
        OrderStatus,
        Role,
        Sauce,
        StatusHistoryEntry,
        User,
    },
    pricing::PricedItem,
    traits::{
        AuthApiError,
        CatalogStore,
        ChatApiError,
        ChatManagement,
        NotificationApiError,
        NotificationManagement,
        OrderFlowError,
        OrderLifecycleDatabase,
        OrderManagement,
        UserStore,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl std::fmt::Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteDatabase ({})", self.url)
    }
}

impl SqliteDatabase {
    /// Creates a new connection pool (and the database itself, if missing) for the given URL.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        debug!("🗃️ Creating new connection pool for database at {url}");
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&mut self) {
        self.pool.close().await;
    }

    //------------------------------------   Seeding helpers   -------------------------------------
    // Mostly used by tests and provisioning tools to populate the catalog and user tables.

    pub async fn add_user(&self, display_name: &str, role: Role, auth_token: &str) -> Result<i64, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        users::insert_user(display_name, role, auth_token, &mut conn).await
    }

    pub async fn add_dish(
        &self,
        name: &str,
        price: Cents,
        sauce_included: bool,
        versions: &[(&str, Cents)],
    ) -> Result<i64, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        catalog::insert_dish(name, price, sauce_included, versions, &mut conn).await
    }

    pub async fn add_sauce(&self, name: &str, price: Cents) -> Result<i64, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        catalog::insert_sauce(name, price, &mut conn).await
    }

    pub async fn add_extra(&self, name: &str, price: Cents) -> Result<i64, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        catalog::insert_extra(name, price, &mut conn).await
    }

    pub async fn add_ingredient(&self, name: &str) -> Result<i64, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        catalog::insert_ingredient(name, &mut conn).await
    }
}

impl OrderLifecycleDatabase for SqliteDatabase {
    async fn insert_full_order(
        &self,
        order: &NewOrder,
        items: &[PricedItem],
        total: Cents,
    ) -> Result<Order, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let order_id = orders::insert_full_order(order, items, total, &mut tx).await?;
        let result = orders::fetch_order(order_id, &mut tx)
            .await?
            .ok_or_else(|| OrderFlowError::NotFound(format!("Order {order_id} vanished inside its own insert")))?;
        tx.commit().await?;
        debug!("🗃️ Order {} inserted with {} items, total {}", result.id, items.len(), result.total_price);
        Ok(result)
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order(order_id, &mut conn).await?)
    }

    async fn update_order_status(
        &self,
        order_id: i64,
        status: OrderStatus,
        notes: Option<&str>,
    ) -> Result<Order, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        orders::update_status(order_id, status, notes, &mut tx).await?;
        let order = orders::fetch_order(order_id, &mut tx)
            .await?
            .ok_or_else(|| OrderFlowError::NotFound(format!("Order {order_id}")))?;
        tx.commit().await?;
        trace!("🗃️ Order {order_id} moved to status {status}");
        Ok(order)
    }

    async fn set_item_ready(
        &self,
        order_id: i64,
        item_id: i64,
        is_ready: bool,
    ) -> Result<Option<OrderItem>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::set_item_ready(order_id, item_id, is_ready, &mut conn).await?)
    }

    async fn set_archived(&self, order_id: i64, archived: bool) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::set_archived(order_id, archived, &mut conn).await?)
    }

    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        Ok(notifications::insert_notification(notification, &mut conn).await?)
    }

    async fn staff_user_ids(&self) -> Result<Vec<i64>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::staff_user_ids(&mut conn).await?)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn order_by_id(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order(order_id, &mut conn).await?)
    }

    async fn items_for_order(&self, order_id: i64) -> Result<Vec<OrderItemView>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::items_for_order(order_id, &mut conn).await?)
    }

    async fn history_for_order(&self, order_id: i64) -> Result<Vec<StatusHistoryEntry>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::history_for_order(order_id, &mut conn).await?)
    }

    async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::orders_for_user(user_id, &mut conn).await?)
    }

    async fn search_orders(&self, filter: OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::search_orders(filter, &mut conn).await?)
    }
}

impl NotificationManagement for SqliteDatabase {
    async fn notifications_for_user(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<Notification>, NotificationApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(notifications::notifications_for_user(user_id, limit, &mut conn).await?)
    }

    async fn unread_count(&self, user_id: i64) -> Result<i64, NotificationApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(notifications::unread_count(user_id, &mut conn).await?)
    }

    async fn mark_as_read(&self, user_id: i64, notification_id: i64) -> Result<bool, NotificationApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(notifications::mark_as_read(user_id, notification_id, &mut conn).await?)
    }

    async fn mark_all_read(&self, user_id: i64) -> Result<u64, NotificationApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(notifications::mark_all_read(user_id, &mut conn).await?)
    }

    async fn delete_notification(&self, user_id: i64, notification_id: i64) -> Result<bool, NotificationApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(notifications::delete_notification(user_id, notification_id, &mut conn).await?)
    }

    async fn delete_all(&self, user_id: i64) -> Result<u64, NotificationApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(notifications::delete_all(user_id, &mut conn).await?)
    }
}

impl ChatManagement for SqliteDatabase {
    async fn order_owner(&self, order_id: i64) -> Result<Option<i64>, ChatApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(chat::order_owner(order_id, &mut conn).await?)
    }

    async fn insert_chat_message(&self, message: NewChatMessage) -> Result<ChatMessage, ChatApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(chat::insert_chat_message(message, &mut conn).await?)
    }

    async fn chat_messages_for_order(&self, order_id: i64) -> Result<Vec<ChatMessage>, ChatApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(chat::chat_messages_for_order(order_id, &mut conn).await?)
    }
}

impl CatalogStore for SqliteDatabase {
    async fn fetch_dish(&self, id: i64) -> Result<Option<(Dish, Vec<DishVersion>)>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::fetch_dish(id, &mut conn).await?)
    }

    async fn fetch_sauce(&self, id: i64) -> Result<Option<Sauce>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::fetch_sauce(id, &mut conn).await?)
    }

    async fn fetch_extra(&self, id: i64) -> Result<Option<Extra>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::fetch_extra(id, &mut conn).await?)
    }

    async fn fetch_ingredient(&self, id: i64) -> Result<Option<Ingredient>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::fetch_ingredient(id, &mut conn).await?)
    }
}

impl UserStore for SqliteDatabase {
    async fn verify_credential(&self, token: &str) -> Result<Option<User>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::user_by_token(token, &mut conn).await?)
    }

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::fetch_user(user_id, &mut conn).await?)
    }
}
