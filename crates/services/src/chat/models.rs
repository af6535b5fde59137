use chrono::{DateTime, Utc};
use inference_providers::{ChatMessage, MessageRole, SearchResult, StreamChunk};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{chat::errors::ChatError, templates::TemplateId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub Uuid);

impl ChatId {
    pub fn new() -> Self {
        ChatId(Uuid::new_v4())
    }
}

impl Default for ChatId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::str::FromStr for ChatId {
    type Err = ChatError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim())
            .map(ChatId)
            .map_err(|_| ChatError::Validation(format!("Invalid conversation ID: {value}")))
    }
}

impl From<Uuid> for ChatId {
    fn from(uuid: Uuid) -> Self {
        ChatId(uuid)
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub Uuid);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A conversation owned by one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,
    pub user_id: UserId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A stored conversation turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub chat_id: ChatId,
    pub role: MessageRole,
    pub content: String,
    pub sources: Option<Vec<SearchResult>>,
    pub reasoning: Option<String>,
    /// Model that produced an assistant message
    pub model: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for ChatMessage {
    fn from(message: Message) -> Self {
        ChatMessage {
            role: message.role,
            content: message.content,
        }
    }
}

/// Input for persisting a message
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub chat_id: ChatId,
    pub role: MessageRole,
    pub content: String,
    pub sources: Option<Vec<SearchResult>>,
    pub reasoning: Option<String>,
    pub model: Option<String>,
}

impl NewMessage {
    pub fn user(chat_id: ChatId, content: impl Into<String>) -> Self {
        Self {
            chat_id,
            role: MessageRole::User,
            content: content.into(),
            sources: None,
            reasoning: None,
            model: None,
        }
    }
}

/// How the answer is augmented with search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Plain generation
    #[default]
    Off,
    /// Web search results are merged into the prompt
    Web,
    /// The answer engine's response is the answer; no generation call
    AnswerEngine,
}

/// One chat turn as requested by a user
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub user_id: UserId,
    pub message: String,
    /// Continue this conversation; a new one is created when absent
    pub conversation_id: Option<ChatId>,
    /// Provider identifier; the configured default when absent
    pub provider: Option<String>,
    pub model: Option<String>,
    pub search_mode: SearchMode,
    pub search_result_count: Option<u32>,
    pub system_prompt: Option<String>,
    /// Saved template used as system prompt when `system_prompt` is absent
    pub template_id: Option<TemplateId>,
    /// Client wall-clock time, prepended to the system prompt
    pub date_time: Option<String>,
}

/// Outbound event of a chat response stream.
///
/// Serialized untagged, so every variant is a single-key JSON object such as
/// `{"content":"..."}` or `{"done":true}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChatStreamEvent {
    ConversationId {
        #[serde(rename = "conversationId")]
        conversation_id: ChatId,
    },
    Sources {
        sources: Vec<SearchResult>,
        #[serde(
            rename = "searchUsageRemaining",
            skip_serializing_if = "Option::is_none"
        )]
        search_usage_remaining: Option<i64>,
    },
    Reasoning {
        reasoning: String,
    },
    Content {
        content: String,
    },
    Error {
        error: String,
    },
    Done {
        done: bool,
    },
}

impl ChatStreamEvent {
    pub fn done() -> Self {
        ChatStreamEvent::Done { done: true }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ChatStreamEvent::Error {
            error: message.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ChatStreamEvent::Done { .. })
    }
}

impl From<StreamChunk> for ChatStreamEvent {
    fn from(chunk: StreamChunk) -> Self {
        match chunk {
            StreamChunk::Content(content) => ChatStreamEvent::Content { content },
            StreamChunk::Reasoning(reasoning) => ChatStreamEvent::Reasoning { reasoning },
        }
    }
}

/// Visible and reasoning text collected while streaming
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AccumulatedAnswer {
    pub visible_text: String,
    pub reasoning_text: String,
}

impl AccumulatedAnswer {
    pub fn push(&mut self, chunk: &StreamChunk) {
        match chunk {
            StreamChunk::Content(text) => self.visible_text.push_str(text),
            StreamChunk::Reasoning(text) => self.reasoning_text.push_str(text),
        }
    }

    pub fn has_visible_text(&self) -> bool {
        !self.visible_text.is_empty()
    }

    pub fn reasoning(&self) -> Option<String> {
        (!self.reasoning_text.is_empty()).then(|| self.reasoning_text.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_wire_shapes() {
        let id = ChatId(Uuid::nil());
        assert_eq!(
            serde_json::to_value(ChatStreamEvent::ConversationId { conversation_id: id }).unwrap(),
            json!({"conversationId": "00000000-0000-0000-0000-000000000000"})
        );
        assert_eq!(
            serde_json::to_value(ChatStreamEvent::Content {
                content: "hi".into()
            })
            .unwrap(),
            json!({"content": "hi"})
        );
        assert_eq!(
            serde_json::to_value(ChatStreamEvent::done()).unwrap(),
            json!({"done": true})
        );
        assert_eq!(
            serde_json::to_value(ChatStreamEvent::error("boom")).unwrap(),
            json!({"error": "boom"})
        );
    }

    #[test]
    fn test_sources_event_optional_remaining() {
        let source = SearchResult {
            title: "T".into(),
            url: "https://t.example".into(),
            content: "C".into(),
        };
        let without = ChatStreamEvent::Sources {
            sources: vec![source.clone()],
            search_usage_remaining: None,
        };
        assert_eq!(
            serde_json::to_value(without).unwrap(),
            json!({"sources": [{"title": "T", "url": "https://t.example", "content": "C"}]})
        );

        let with = ChatStreamEvent::Sources {
            sources: vec![source],
            search_usage_remaining: Some(42),
        };
        assert_eq!(serde_json::to_value(with).unwrap()["searchUsageRemaining"], 42);
    }

    #[test]
    fn test_chat_id_parsing() {
        let id: ChatId = "6f1c0d4e-8f4a-4b8e-9a51-0c2f1e0b7d11".parse().unwrap();
        assert_eq!(id.to_string(), "6f1c0d4e-8f4a-4b8e-9a51-0c2f1e0b7d11");
        assert!(matches!(
            "not-a-uuid".parse::<ChatId>(),
            Err(ChatError::Validation(_))
        ));
    }

    #[test]
    fn test_accumulator() {
        let mut answer = AccumulatedAnswer::default();
        assert!(answer.reasoning().is_none());

        answer.push(&StreamChunk::Reasoning("think".into()));
        answer.push(&StreamChunk::Content("Hel".into()));
        answer.push(&StreamChunk::Content("lo".into()));

        assert_eq!(answer.visible_text, "Hello");
        assert_eq!(answer.reasoning().as_deref(), Some("think"));
        assert!(answer.has_visible_text());
    }

    #[test]
    fn test_search_mode_names() {
        assert_eq!(
            serde_json::from_value::<SearchMode>(json!("answer_engine")).unwrap(),
            SearchMode::AnswerEngine
        );
        assert_eq!(SearchMode::default(), SearchMode::Off);
    }
}
