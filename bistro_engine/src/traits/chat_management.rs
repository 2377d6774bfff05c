use crate::{
    db_types::{ChatMessage, NewChatMessage},
    traits::ChatApiError,
};

#[allow(async_fn_in_trait)]
pub trait ChatManagement {
    /// The owning user of the order's chat sub-channel, or `None` when the order does not exist.
    async fn order_owner(&self, order_id: i64) -> Result<Option<i64>, ChatApiError>;

    async fn insert_chat_message(&self, message: NewChatMessage) -> Result<ChatMessage, ChatApiError>;

    /// Transcript in timestamp order (oldest first).
    async fn chat_messages_for_order(&self, order_id: i64) -> Result<Vec<ChatMessage>, ChatApiError>;
}
