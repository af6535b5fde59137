use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use services::chat::{
    models::{Chat, ChatId, Message, MessageId, NewMessage},
    ports::ChatRepository,
};
use services::UserId;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

#[derive(Default)]
struct ChatStore {
    chats: HashMap<ChatId, Chat>,
    messages: HashMap<ChatId, Vec<Message>>,
}

/// Process-local chat storage. Contents are lost on restart.
#[derive(Default)]
pub struct InMemoryChatRepository {
    store: RwLock<ChatStore>,
}

impl InMemoryChatRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatRepository for InMemoryChatRepository {
    async fn create_chat(&self, user_id: &UserId, title: &str) -> Result<Chat> {
        let now = Utc::now();
        let chat = Chat {
            id: ChatId::new(),
            user_id: user_id.clone(),
            title: title.to_string(),
            created_at: now,
            updated_at: now,
        };

        let mut store = self.store.write().await;
        store.chats.insert(chat.id, chat.clone());
        store.messages.insert(chat.id, Vec::new());

        debug!("Created chat: {} for user: {}", chat.id, user_id);
        Ok(chat)
    }

    async fn get_chat(&self, id: ChatId) -> Result<Option<Chat>> {
        Ok(self.store.read().await.chats.get(&id).cloned())
    }

    async fn list_chats(&self, user_id: &UserId) -> Result<Vec<Chat>> {
        let store = self.store.read().await;
        let mut chats: Vec<Chat> = store
            .chats
            .values()
            .filter(|c| &c.user_id == user_id)
            .cloned()
            .collect();
        chats.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(chats)
    }

    async fn create_message(&self, message: NewMessage) -> Result<Message> {
        let mut store = self.store.write().await;
        let now = Utc::now();

        let chat = store
            .chats
            .get_mut(&message.chat_id)
            .ok_or_else(|| anyhow::anyhow!("Chat {} does not exist", message.chat_id))?;
        chat.updated_at = now;

        let stored = Message {
            id: MessageId(Uuid::new_v4()),
            chat_id: message.chat_id,
            role: message.role,
            content: message.content,
            sources: message.sources,
            reasoning: message.reasoning,
            model: message.model,
            created_at: now,
        };
        store
            .messages
            .entry(stored.chat_id)
            .or_default()
            .push(stored.clone());

        debug!("Stored message: {} in chat: {}", stored.id, stored.chat_id);
        Ok(stored)
    }

    async fn list_messages(&self, chat_id: ChatId) -> Result<Vec<Message>> {
        Ok(self
            .store
            .read()
            .await
            .messages
            .get(&chat_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn rename_chat(&self, id: ChatId, title: &str) -> Result<bool> {
        let mut store = self.store.write().await;
        Ok(match store.chats.get_mut(&id) {
            Some(chat) => {
                chat.title = title.to_string();
                chat.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn delete_chat(&self, id: ChatId) -> Result<bool> {
        let mut store = self.store.write().await;
        store.messages.remove(&id);
        Ok(store.chats.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use services::chat::models::NewMessage;

    #[tokio::test]
    async fn test_messages_keep_order_and_bump_chat() {
        let repo = InMemoryChatRepository::new();
        let user = UserId::from("alice");
        let chat = repo.create_chat(&user, "First").await.unwrap();

        repo.create_message(NewMessage::user(chat.id, "one"))
            .await
            .unwrap();
        repo.create_message(NewMessage::user(chat.id, "two"))
            .await
            .unwrap();

        let messages = repo.list_messages(chat.id).await.unwrap();
        let contents: Vec<_> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["one", "two"]);

        let reloaded = repo.get_chat(chat.id).await.unwrap().unwrap();
        assert!(reloaded.updated_at >= chat.updated_at);
    }

    #[tokio::test]
    async fn test_list_chats_is_per_user_and_recent_first() {
        let repo = InMemoryChatRepository::new();
        let alice = UserId::from("alice");
        let older = repo.create_chat(&alice, "Older").await.unwrap();
        let newer = repo.create_chat(&alice, "Newer").await.unwrap();
        repo.create_chat(&UserId::from("bob"), "Bob's").await.unwrap();

        repo.create_message(NewMessage::user(older.id, "bump"))
            .await
            .unwrap();

        let chats = repo.list_chats(&alice).await.unwrap();
        assert_eq!(chats.len(), 2);
        assert_eq!(chats[0].id, older.id);
        assert_eq!(chats[1].id, newer.id);
    }

    #[tokio::test]
    async fn test_message_for_unknown_chat_fails() {
        let repo = InMemoryChatRepository::new();
        assert!(repo
            .create_message(NewMessage::user(ChatId::new(), "orphan"))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_rename_and_delete() {
        let repo = InMemoryChatRepository::new();
        let chat = repo
            .create_chat(&UserId::from("alice"), "Title")
            .await
            .unwrap();

        assert!(repo.rename_chat(chat.id, "Renamed").await.unwrap());
        assert_eq!(
            repo.get_chat(chat.id).await.unwrap().unwrap().title,
            "Renamed"
        );

        assert!(repo.delete_chat(chat.id).await.unwrap());
        assert!(!repo.delete_chat(chat.id).await.unwrap());
        assert!(repo.get_chat(chat.id).await.unwrap().is_none());
        assert!(repo.list_messages(chat.id).await.unwrap().is_empty());
        assert!(!repo.rename_chat(chat.id, "Gone").await.unwrap());
    }
}
