use crate::chat::{errors::ChatError, models};
use crate::UserId;
use anyhow::Result;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

#[cfg(any(test, feature = "test-mocks"))]
use mockall::automock;

pub type ChatEventStream = Pin<Box<dyn Stream<Item = models::ChatStreamEvent> + Send>>;

#[cfg_attr(any(test, feature = "test-mocks"), automock)]
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Create a new chat owned by `user_id`
    async fn create_chat(&self, user_id: &UserId, title: &str) -> Result<models::Chat>;

    /// Get a chat by ID regardless of owner
    async fn get_chat(&self, id: models::ChatId) -> Result<Option<models::Chat>>;

    /// All chats of a user, most recently updated first
    async fn list_chats(&self, user_id: &UserId) -> Result<Vec<models::Chat>>;

    /// Append a message; also bumps the chat's `updated_at`
    async fn create_message(&self, message: models::NewMessage) -> Result<models::Message>;

    /// Messages of a chat, oldest first
    async fn list_messages(&self, chat_id: models::ChatId) -> Result<Vec<models::Message>>;

    /// Returns false if the chat does not exist
    async fn rename_chat(&self, id: models::ChatId, title: &str) -> Result<bool>;

    /// Delete a chat and its messages. Returns false if it did not exist.
    async fn delete_chat(&self, id: models::ChatId) -> Result<bool>;
}

#[async_trait]
pub trait ChatServiceTrait: Send + Sync {
    /// Run one chat turn.
    ///
    /// Errors detected before streaming begins (validation, ownership,
    /// configuration, quota, upstream rejection) are returned directly. Once
    /// the stream is returned every failure is reported in-band and the
    /// stream always ends with exactly one `done` event.
    async fn stream_chat(&self, request: models::ChatRequest)
        -> Result<ChatEventStream, ChatError>;
}
