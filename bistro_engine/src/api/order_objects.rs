use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Order, OrderItem, OrderItemExtra, OrderStatus, OrderType, StatusHistoryEntry},
    traits::{OrderFlowError, OrderManagement},
};

//--------------------------------------  OrderQueryFilter   ---------------------------------------------------------
/// Search criteria for the admin order listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderQueryFilter {
    pub user_id: Option<i64>,
    #[serde(default)]
    pub statuses: Vec<OrderStatus>,
    pub archived: Option<bool>,
    pub order_type: Option<OrderType>,
}

impl OrderQueryFilter {
    pub fn with_user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.statuses.push(status);
        self
    }

    pub fn with_archived(mut self, archived: bool) -> Self {
        self.archived = Some(archived);
        self
    }

    pub fn with_order_type(mut self, order_type: OrderType) -> Self {
        self.order_type = Some(order_type);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.statuses.is_empty() && self.archived.is_none() && self.order_type.is_none()
    }
}

//--------------------------------------   OrderItemView     ---------------------------------------------------------
/// An order item with its owned associations resolved.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItemView {
    #[serde(flatten)]
    pub item: OrderItem,
    pub extras: Vec<OrderItemExtra>,
    pub removed_ingredient_ids: Vec<i64>,
}

//--------------------------------------    OrderResult      ---------------------------------------------------------
/// The full order aggregate as served to clients: the order row, its items and the status-history
/// ledger.
#[derive(Debug, Clone, Serialize)]
pub struct OrderResult {
    pub order: Order,
    pub items: Vec<OrderItemView>,
    pub history: Vec<StatusHistoryEntry>,
}

impl OrderResult {
    pub async fn load<B: OrderManagement>(db: &B, order: Order) -> Result<Self, OrderFlowError> {
        let items = db.items_for_order(order.id).await?;
        let history = db.history_for_order(order.id).await?;
        Ok(Self { order, items, history })
    }
}
