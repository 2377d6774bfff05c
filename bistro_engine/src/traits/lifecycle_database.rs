use bistro_common::Cents;

use crate::{
    db_types::{NewNotification, NewOrder, Notification, Order, OrderItem, OrderStatus},
    pricing::PricedItem,
    traits::OrderFlowError,
};

/// The backing store for the order lifecycle manager.
///
/// Implementations must guarantee that [`Self::insert_full_order`] is a single transaction: the
/// order row, its items (with extras and removed ingredients) and the first status-history entry
/// all commit together, or nothing is persisted.
#[allow(async_fn_in_trait)]
pub trait OrderLifecycleDatabase {
    /// Persist the order, its priced items and the initial history entry atomically. `total`
    /// includes the delivery fee.
    async fn insert_full_order(
        &self,
        order: &NewOrder,
        items: &[PricedItem],
        total: Cents,
    ) -> Result<Order, OrderFlowError>;

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError>;

    /// Update the status (and, when notes are given, the restaurant message) and append a
    /// status-history entry carrying the human-readable label. Returns the updated order.
    async fn update_order_status(
        &self,
        order_id: i64,
        status: OrderStatus,
        notes: Option<&str>,
    ) -> Result<Order, OrderFlowError>;

    /// Toggle the readiness flag on an item. Returns `None` when the item does not exist or does
    /// not belong to the given order.
    async fn set_item_ready(
        &self,
        order_id: i64,
        item_id: i64,
        is_ready: bool,
    ) -> Result<Option<OrderItem>, OrderFlowError>;

    /// Toggle the archived flag. Returns `None` when the order does not exist.
    async fn set_archived(&self, order_id: i64, archived: bool) -> Result<Option<Order>, OrderFlowError>;

    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, OrderFlowError>;

    /// Ids of all staff users, for admin fan-out on new orders.
    async fn staff_user_ids(&self) -> Result<Vec<i64>, OrderFlowError>;
}
