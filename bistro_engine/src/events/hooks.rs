use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    ChatMessageEvent,
    EventHandler,
    EventProducer,
    Hook,
    ItemReadyEvent,
    OrderArchivedEvent,
    OrderCreatedEvent,
    StatusChangedEvent,
};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_created_producer: Vec<EventProducer<OrderCreatedEvent>>,
    pub status_changed_producer: Vec<EventProducer<StatusChangedEvent>>,
    pub item_ready_producer: Vec<EventProducer<ItemReadyEvent>>,
    pub order_archived_producer: Vec<EventProducer<OrderArchivedEvent>>,
    pub chat_message_producer: Vec<EventProducer<ChatMessageEvent>>,
}

pub struct EventHandlers {
    pub on_order_created: Option<EventHandler<OrderCreatedEvent>>,
    pub on_status_changed: Option<EventHandler<StatusChangedEvent>>,
    pub on_item_ready: Option<EventHandler<ItemReadyEvent>>,
    pub on_order_archived: Option<EventHandler<OrderArchivedEvent>>,
    pub on_chat_message: Option<EventHandler<ChatMessageEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_created = hooks.on_order_created.map(|f| EventHandler::new(buffer_size, f));
        let on_status_changed = hooks.on_status_changed.map(|f| EventHandler::new(buffer_size, f));
        let on_item_ready = hooks.on_item_ready.map(|f| EventHandler::new(buffer_size, f));
        let on_order_archived = hooks.on_order_archived.map(|f| EventHandler::new(buffer_size, f));
        let on_chat_message = hooks.on_chat_message.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_created, on_status_changed, on_item_ready, on_order_archived, on_chat_message }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_created {
            result.order_created_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_status_changed {
            result.status_changed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_item_ready {
            result.item_ready_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_archived {
            result.order_archived_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_chat_message {
            result.chat_message_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_created {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_status_changed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_item_ready {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_order_archived {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_chat_message {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_created: Option<Hook<OrderCreatedEvent>>,
    pub on_status_changed: Option<Hook<StatusChangedEvent>>,
    pub on_item_ready: Option<Hook<ItemReadyEvent>>,
    pub on_order_archived: Option<Hook<OrderArchivedEvent>>,
    pub on_chat_message: Option<Hook<ChatMessageEvent>>,
}

impl EventHooks {
    pub fn on_order_created<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderCreatedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_created = Some(Arc::new(f));
        self
    }

    pub fn on_status_changed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(StatusChangedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_status_changed = Some(Arc::new(f));
        self
    }

    pub fn on_item_ready<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(ItemReadyEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_item_ready = Some(Arc::new(f));
        self
    }

    pub fn on_order_archived<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderArchivedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_archived = Some(Arc::new(f));
        self
    }

    pub fn on_chat_message<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(ChatMessageEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_chat_message = Some(Arc::new(f));
        self
    }
}
