use crate::{
    chat::{
        models::{Chat, ChatId},
        ports::ChatRepository,
    },
    conversations::{
        errors::ConversationError,
        models::{ConversationWithMessages, MAX_TITLE_CHARS},
        ports::ConversationServiceTrait,
    },
    UserId,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Conversation service for managing a user's stored chats
pub struct ConversationServiceImpl {
    pub chat_repository: Arc<dyn ChatRepository>,
}

impl ConversationServiceImpl {
    pub fn new(chat_repository: Arc<dyn ChatRepository>) -> Self {
        Self { chat_repository }
    }

    /// Load a chat and check that it belongs to the user
    async fn owned_chat(&self, id: ChatId, user_id: &UserId) -> Result<Chat, ConversationError> {
        let chat = self.chat_repository.get_chat(id).await.map_err(|e| {
            ConversationError::InternalError(format!("Failed to get conversation: {e}"))
        })?;

        chat.filter(|c| &c.user_id == user_id)
            .ok_or(ConversationError::NotFound)
    }
}

#[async_trait]
impl ConversationServiceTrait for ConversationServiceImpl {
    async fn list_conversations(&self, user_id: &UserId) -> Result<Vec<Chat>, ConversationError> {
        self.chat_repository
            .list_chats(user_id)
            .await
            .map_err(|e| ConversationError::InternalError(format!("Failed to list conversations: {e}")))
    }

    async fn get_conversation(
        &self,
        id: ChatId,
        user_id: &UserId,
    ) -> Result<ConversationWithMessages, ConversationError> {
        let chat = self.owned_chat(id, user_id).await?;
        let messages = self.chat_repository.list_messages(id).await.map_err(|e| {
            ConversationError::InternalError(format!("Failed to get conversation messages: {e}"))
        })?;

        Ok(ConversationWithMessages { chat, messages })
    }

    async fn rename_conversation(
        &self,
        id: ChatId,
        user_id: &UserId,
        title: &str,
    ) -> Result<Chat, ConversationError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ConversationError::InvalidParams(
                "Title must not be empty".to_string(),
            ));
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(ConversationError::InvalidParams(format!(
                "Title must be at most {MAX_TITLE_CHARS} characters"
            )));
        }

        let mut chat = self.owned_chat(id, user_id).await?;
        let renamed = self
            .chat_repository
            .rename_chat(id, title)
            .await
            .map_err(|e| {
                ConversationError::InternalError(format!("Failed to rename conversation: {e}"))
            })?;
        if !renamed {
            return Err(ConversationError::NotFound);
        }

        tracing::info!(conversation_id = %id, user_id = %user_id, "Renamed conversation");
        chat.title = title.to_string();
        Ok(chat)
    }

    async fn delete_conversation(
        &self,
        id: ChatId,
        user_id: &UserId,
    ) -> Result<(), ConversationError> {
        self.owned_chat(id, user_id).await?;

        let deleted = self.chat_repository.delete_chat(id).await.map_err(|e| {
            ConversationError::InternalError(format!("Failed to delete conversation: {e}"))
        })?;
        if !deleted {
            return Err(ConversationError::NotFound);
        }

        tracing::info!(conversation_id = %id, user_id = %user_id, "Deleted conversation");
        Ok(())
    }
}
