use crate::{
    api::order_objects::{OrderItemView, OrderQueryFilter},
    db_types::{Order, StatusHistoryEntry},
    traits::OrderFlowError,
};

/// Read-side queries over orders.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    async fn order_by_id(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError>;

    /// Items for the order, each with its locked extras and removed-ingredient references.
    async fn items_for_order(&self, order_id: i64) -> Result<Vec<OrderItemView>, OrderFlowError>;

    async fn history_for_order(&self, order_id: i64) -> Result<Vec<StatusHistoryEntry>, OrderFlowError>;

    /// Most recent first.
    async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderFlowError>;

    async fn search_orders(&self, filter: OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError>;
}
