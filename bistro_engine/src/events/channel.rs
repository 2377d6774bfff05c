//! The engine's event channel.
//!
//! Lifecycle milestones (order created, status changed, item ready, archive toggled, chat
//! message) are published by the APIs and drained by one dispatch task per event type. The hook
//! runs inline in the dispatch loop, one event at a time: the live channel relays status updates
//! into rooms, and handling them out of publication order would show a customer "Prête" before
//! "En préparation". Publishing never waits on the hook body, only on queue capacity.

use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::sync::mpsc;

/// An async callback invoked with each published event.
pub type Hook<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// One event type's dispatch loop: a bounded queue drained by a single task running the hook.
pub struct EventHandler<E: Send + Sync + 'static> {
    queue: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    hook: Hook<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, hook: Hook<E>) -> Self {
        let (sender, queue) = mpsc::channel(buffer_size);
        Self { queue, sender, hook }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    /// Drains the queue until the last producer is dropped, then returns.
    ///
    /// Events are handled strictly in publication order; a slow hook back-pressures publishers
    /// through the queue rather than letting later events overtake earlier ones.
    pub async fn start_handler(mut self) {
        debug!("📬️ Event dispatch loop starting");
        // Our own sender must go, or the loop would never see the queue close.
        drop(self.sender);
        let mut dispatched = 0u64;
        while let Some(event) = self.queue.recv().await {
            (self.hook)(event).await;
            dispatched += 1;
            trace!("📬️ Event dispatched ({dispatched} total)");
        }
        debug!("📬️ All producers dropped; dispatch loop ending after {dispatched} events");
    }
}

/// The publishing half of an event channel. Cheap to clone; the order-flow and chat APIs hold one
/// per wired hook.
#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    pub async fn publish_event(&self, event: E) {
        if self.sender.send(event).await.is_err() {
            error!("📬️ Event dropped: the dispatch loop has already shut down");
        }
    }
}
