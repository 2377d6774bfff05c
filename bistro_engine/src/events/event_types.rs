use serde::{Deserialize, Serialize};

use crate::db_types::{ChatMessage, Notification, Order, OrderItem, OrderStatus};

/// Fired after a checkout transaction commits, unless the order was created pre-archived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order: Order,
    /// Admin notifications persisted for this order (one per staff user, excluding the ordering
    /// user if they are staff).
    pub notifications: Vec<Notification>,
}

/// Fired after a status change on a non-archived order. Archived orders record history silently
/// and never produce this event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChangedEvent {
    pub order: Order,
    pub new_status: OrderStatus,
    pub notes: Option<String>,
    /// The notification persisted for the order's owner. Persistence happens before live delivery;
    /// the two paths are independent.
    pub notification: Notification,
}

/// Fired when an admin toggles the readiness flag on an order item. Pure state toggle, so there is
/// no notification and no history entry attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemReadyEvent {
    pub order_id: i64,
    pub item: OrderItem,
}

/// Fired when an order is archived or un-archived. Admin-facing only; the customer is deliberately
/// not notified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderArchivedEvent {
    pub order: Order,
    pub archived: bool,
}

/// Fired after a chat message is persisted for an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessageEvent {
    pub message: ChatMessage,
    /// The order's owning user, so the live channel can address the right rooms.
    pub order_user_id: i64,
}
