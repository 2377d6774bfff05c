use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{
        NewNotification,
        NewOrder,
        NotificationData,
        NotificationType,
        Order,
        OrderItem,
        OrderStatus,
    },
    events::{EventProducers, ItemReadyEvent, OrderArchivedEvent, OrderCreatedEvent, StatusChangedEvent},
    pricing,
    pricing::FeeSchedule,
    traits::{CatalogStore, OrderFlowError, OrderLifecycleDatabase},
};

/// `OrderFlowApi` is the order lifecycle manager: it owns checkout, the status state machine, the
/// item-readiness sub-state and the archive toggle, and fires the event hooks that feed the live
/// channel.
pub struct OrderFlowApi<B> {
    db: B,
    fees: FeeSchedule,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, fees: FeeSchedule, producers: EventProducers) -> Self {
        Self { db, fees, producers }
    }
}

impl<B> OrderFlowApi<B>
where B: OrderLifecycleDatabase + CatalogStore
{
    /// Create an order from a checkout request.
    ///
    /// Every price is re-derived from the catalog; the whole request is rejected when any
    /// referenced dish, sauce, extra or ingredient does not exist. Order, items and the first
    /// history entry (status 0) persist in one transaction. Fan-out to the admin room happens
    /// after the transaction commits, and is suppressed entirely when the order was created
    /// pre-archived.
    pub async fn create_order(&self, order: NewOrder) -> Result<Order, OrderFlowError> {
        if order.items.is_empty() {
            return Err(OrderFlowError::Validation("The order contains no items".to_string()));
        }
        if let Some(line) = order.items.iter().find(|i| i.quantity <= 0) {
            return Err(OrderFlowError::Validation(format!(
                "Invalid quantity {} for item {:?}",
                line.quantity, line.item
            )));
        }
        let catalog = self.db.snapshot_for_items(&order.items).await?;
        let priced = pricing::price_items(&order.items, &catalog)?;
        let total = pricing::order_total(&priced, order.order_type, &self.fees);
        let created = self.db.insert_full_order(&order, &priced, total).await?;
        debug!("🔄️📦️ Order #{} created for user {} with total {total}", created.id, created.user_id);
        if created.archived {
            info!("🔄️📦️ Order #{} was created pre-archived; fan-out suppressed", created.id);
            return Ok(created);
        }
        let notifications = self.notify_staff_of_new_order(&created).await;
        let event = OrderCreatedEvent { order: created.clone(), notifications };
        for emitter in &self.producers.order_created_producer {
            emitter.publish_event(event.clone()).await;
        }
        Ok(created)
    }

    /// Persist one admin notification per staff user, excluding the ordering user if they are
    /// staff themselves.
    ///
    /// The order has already committed when this runs, so a failed notification must not fail the
    /// checkout: a client retrying on error would duplicate the order. Failures are logged and
    /// skipped; staff recover through the pull API and the order list.
    async fn notify_staff_of_new_order(&self, order: &Order) -> Vec<crate::db_types::Notification> {
        let staff_ids = match self.db.staff_user_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                warn!("🔄️📦️ Could not list staff users to notify about order #{}: {e}", order.id);
                return Vec::new();
            },
        };
        let mut notifications = Vec::new();
        for staff_id in staff_ids {
            if staff_id == order.user_id {
                continue;
            }
            let result = self
                .db
                .insert_notification(NewNotification {
                    user_id: staff_id,
                    kind: NotificationType::OrderNew,
                    title: "Nouvelle commande".to_string(),
                    message: format!("Commande #{} — {}", order.id, order.total_price),
                    data: NotificationData { order_id: Some(order.id), ..Default::default() },
                })
                .await;
            match result {
                Ok(notification) => notifications.push(notification),
                Err(e) => {
                    warn!("🔄️📦️ Could not notify staff user {staff_id} about order #{}: {e}", order.id)
                },
            }
        }
        trace!("🔄️📦️ {} admin notifications persisted for order #{}", notifications.len(), order.id);
        notifications
    }

    /// Change an order's status.
    ///
    /// Any known status may be set from any other: forward-only transitions are deliberately not
    /// enforced, which doubles as the admin "undo" path. Concurrent updates are last-write-wins;
    /// there is no optimistic-concurrency token.
    ///
    /// History is always appended, archived or not. Only when the order is not archived is a
    /// notification persisted for the owner and the status-changed hook fired; archived orders
    /// are closed to the customer.
    pub async fn set_status(
        &self,
        order_id: i64,
        new_status: OrderStatus,
        notes: Option<&str>,
    ) -> Result<Order, OrderFlowError> {
        let order = self
            .db
            .fetch_order(order_id)
            .await?
            .ok_or_else(|| OrderFlowError::NotFound(format!("Order {order_id}")))?;
        let updated = self.db.update_order_status(order_id, new_status, notes).await?;
        debug!("🔄️🚦️ Order #{order_id} status: {} → {}", order.status, new_status);
        if updated.archived {
            trace!("🔄️🚦️ Order #{order_id} is archived; history recorded, customer not notified");
            return Ok(updated);
        }
        let notification = self
            .db
            .insert_notification(NewNotification {
                user_id: updated.user_id,
                kind: NotificationType::OrderStatus,
                title: format!("Commande #{order_id}"),
                message: new_status.label().to_string(),
                data: NotificationData {
                    order_id: Some(order_id),
                    status: Some(new_status.code()),
                    status_text: Some(new_status.label().to_string()),
                    notes: notes.map(str::to_string),
                },
            })
            .await?;
        let event = StatusChangedEvent {
            order: updated.clone(),
            new_status,
            notes: notes.map(str::to_string),
            notification,
        };
        for emitter in &self.producers.status_changed_producer {
            emitter.publish_event(event.clone()).await;
        }
        Ok(updated)
    }

    /// Toggle the readiness flag on a single item. Pure state toggle: no notification, no history
    /// entry, only a live event to the admin and order-chat rooms.
    pub async fn set_item_ready(&self, order_id: i64, item_id: i64, is_ready: bool) -> Result<OrderItem, OrderFlowError> {
        let item = self
            .db
            .set_item_ready(order_id, item_id, is_ready)
            .await?
            .ok_or_else(|| OrderFlowError::NotFound(format!("Item {item_id} in order {order_id}")))?;
        trace!("🔄️🍽️ Order #{order_id} item {item_id} ready = {is_ready}");
        let event = ItemReadyEvent { order_id, item: item.clone() };
        for emitter in &self.producers.item_ready_producer {
            emitter.publish_event(event.clone()).await;
        }
        Ok(item)
    }

    /// Toggle the archived flag. Admin-room event only; the customer is deliberately not
    /// notified.
    pub async fn set_archived(&self, order_id: i64, archived: bool) -> Result<Order, OrderFlowError> {
        let order = self
            .db
            .set_archived(order_id, archived)
            .await?
            .ok_or_else(|| OrderFlowError::NotFound(format!("Order {order_id}")))?;
        debug!("🔄️🗂️ Order #{order_id} archived = {archived}");
        let event = OrderArchivedEvent { order: order.clone(), archived };
        for emitter in &self.producers.order_archived_producer {
            emitter.publish_event(event.clone()).await;
        }
        Ok(order)
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}
