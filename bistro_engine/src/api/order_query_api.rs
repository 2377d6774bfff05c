use log::*;

use crate::{
    api::order_objects::{OrderQueryFilter, OrderResult},
    db_types::Order,
    traits::{OrderFlowError, OrderManagement},
};

/// Read-side queries over orders: single-order aggregates, per-user listings and the admin
/// search.
pub struct OrderQueryApi<B> {
    db: B,
}

impl<B> OrderQueryApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> OrderQueryApi<B>
where B: OrderManagement
{
    /// The full aggregate (order, items, history), or `None` when the order does not exist.
    pub async fn order_by_id(&self, order_id: i64) -> Result<Option<OrderResult>, OrderFlowError> {
        match self.db.order_by_id(order_id).await? {
            Some(order) => Ok(Some(OrderResult::load(&self.db, order).await?)),
            None => Ok(None),
        }
    }

    /// Most recent first.
    pub async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderFlowError> {
        self.db.orders_for_user(user_id).await
    }

    pub async fn search(&self, filter: OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError> {
        trace!("🔄️ Searching orders: {filter:?}");
        self.db.search_orders(filter).await
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
