use std::sync::{atomic::AtomicI32, Arc};

use bistro_engine::{
    db_types::{ItemComposition, NewChatMessage, NewOrder, OrderStatus, OrderType, SenderType},
    events::{EventHandlers, EventHooks},
    pricing::FeeSchedule,
    ChatApi,
    OrderFlowApi,
};
use log::*;

mod support;
use support::{seeded_env, tear_down};

#[derive(Default, Clone)]
struct HookCalled {
    called: Arc<AtomicI32>,
}

impl HookCalled {
    pub fn called(&self) {
        let _ = self.called.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    }

    pub fn count(&self) -> i32 {
        self.called.load(std::sync::atomic::Ordering::Relaxed)
    }
}

#[tokio::test]
async fn lifecycle_hooks_fire_per_event() {
    let created = HookCalled::default();
    let status_changed = HookCalled::default();
    let chat = HookCalled::default();

    let mut hooks = EventHooks::default();
    let counter = created.clone();
    hooks.on_order_created(move |ev| {
        info!("🪝️ order created: #{}", ev.order.id);
        counter.called();
        Box::pin(async {})
    });
    let counter = status_changed.clone();
    hooks.on_status_changed(move |ev| {
        info!("🪝️ status changed: #{} → {}", ev.order.id, ev.new_status);
        counter.called();
        Box::pin(async {})
    });
    let counter = chat.clone();
    hooks.on_chat_message(move |ev| {
        info!("🪝️ chat message on order #{}", ev.message.order_id);
        counter.called();
        Box::pin(async {})
    });

    let handlers = EventHandlers::new(10, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let env = seeded_env().await;
    let api = OrderFlowApi::new(env.db.clone(), FeeSchedule::default(), producers.clone());
    let chat_api = ChatApi::new(env.db.clone(), producers);

    let line = ItemComposition::dish(env.tacos_id, 1);
    let order = api.create_order(NewOrder::new(env.customer_id, OrderType::Takeout, vec![line.clone()])).await.unwrap();
    let _ = api.create_order(NewOrder::new(env.customer_id, OrderType::Takeout, vec![line])).await.unwrap();
    api.set_status(order.id, OrderStatus::Confirmed, None).await.unwrap();
    chat_api
        .post_message(NewChatMessage {
            order_id: order.id,
            sender_id: env.customer_id,
            sender_type: SenderType::Client,
            message: "Sans oignons svp".to_string(),
        })
        .await
        .unwrap();

    // Handlers run on their own tasks; give them a beat to drain.
    tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;
    assert_eq!(created.count(), 2);
    assert_eq!(status_changed.count(), 1);
    assert_eq!(chat.count(), 1);
    tear_down(env.db).await;
    info!("🪝️ test complete");
}

#[tokio::test]
async fn archived_status_changes_do_not_fire_the_hook() {
    let status_changed = HookCalled::default();
    let mut hooks = EventHooks::default();
    let counter = status_changed.clone();
    hooks.on_status_changed(move |_| {
        counter.called();
        Box::pin(async {})
    });
    let handlers = EventHandlers::new(10, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let env = seeded_env().await;
    let api = OrderFlowApi::new(env.db.clone(), FeeSchedule::default(), producers);
    let line = ItemComposition::dish(env.tacos_id, 1);
    let order = api.create_order(NewOrder::new(env.customer_id, OrderType::Takeout, vec![line])).await.unwrap();
    api.set_archived(order.id, true).await.unwrap();
    api.set_status(order.id, OrderStatus::Cancelled, None).await.unwrap();

    tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;
    assert_eq!(status_changed.count(), 0);
    tear_down(env.db).await;
}
