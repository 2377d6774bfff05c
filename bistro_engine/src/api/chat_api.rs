use log::*;

use crate::{
    db_types::{ChatMessage, NewChatMessage},
    events::{ChatMessageEvent, EventProducers},
    traits::{ChatApiError, ChatManagement},
};

/// Per-order bidirectional messaging, layered on the same fan-out channel as status events.
pub struct ChatApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> ChatApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> ChatApi<B>
where B: ChatManagement
{
    /// Persist the message, then emit it to the order's chat room. Persistence succeeds or the
    /// whole call fails; a failed live emit is the subscriber's problem, not the sender's.
    pub async fn post_message(&self, message: NewChatMessage) -> Result<ChatMessage, ChatApiError> {
        if message.message.trim().is_empty() {
            return Err(ChatApiError::EmptyMessage);
        }
        let order_user_id = self
            .db
            .order_owner(message.order_id)
            .await?
            .ok_or(ChatApiError::OrderNotFound(message.order_id))?;
        let saved = self.db.insert_chat_message(message).await?;
        debug!("💬️ Chat message {} persisted for order #{}", saved.id, saved.order_id);
        let event = ChatMessageEvent { message: saved.clone(), order_user_id };
        for emitter in &self.producers.chat_message_producer {
            emitter.publish_event(event.clone()).await;
        }
        Ok(saved)
    }

    pub async fn transcript(&self, order_id: i64) -> Result<Vec<ChatMessage>, ChatApiError> {
        self.db.order_owner(order_id).await?.ok_or(ChatApiError::OrderNotFound(order_id))?;
        self.db.chat_messages_for_order(order_id).await
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
