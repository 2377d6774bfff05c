mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Hook};
pub use event_types::{
    ChatMessageEvent,
    ItemReadyEvent,
    OrderArchivedEvent,
    OrderCreatedEvent,
    StatusChangedEvent,
};
pub use hooks::{EventHandlers, EventHooks, EventProducers};
