use crate::{
    chat::models::{Chat, ChatId},
    conversations::{errors::ConversationError, models::ConversationWithMessages},
    UserId,
};
use async_trait::async_trait;

#[async_trait]
pub trait ConversationServiceTrait: Send + Sync {
    /// The user's conversations, most recently updated first
    async fn list_conversations(&self, user_id: &UserId) -> Result<Vec<Chat>, ConversationError>;

    async fn get_conversation(
        &self,
        id: ChatId,
        user_id: &UserId,
    ) -> Result<ConversationWithMessages, ConversationError>;

    async fn rename_conversation(
        &self,
        id: ChatId,
        user_id: &UserId,
        title: &str,
    ) -> Result<Chat, ConversationError>;

    async fn delete_conversation(&self, id: ChatId, user_id: &UserId)
        -> Result<(), ConversationError>;
}
