use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A normalized search record.
///
/// Produced by the search augmentor, rendered into the system prompt and
/// forwarded unchanged to the client as the `sources` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub content: String,
}

/// Everything a provider adapter needs to issue one generation request
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Conversation so far, oldest first, without a system message
    pub messages: Vec<ChatMessage>,
    pub api_key: String,
    pub model: String,
    pub search_results: Option<Vec<SearchResult>>,
    /// Caller-supplied system prompt template
    pub system_prompt: Option<String>,
}

/// Parameters for chat completion requests (OpenAI wire shape)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionParams {
    /// Model ID to use for the completion
    pub model: String,

    /// List of messages comprising the conversation so far
    pub messages: Vec<ChatMessage>,

    /// Whether to stream back partial progress
    pub stream: bool,

    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<i64>,

    /// Sampling temperature between 0 and 2
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

pub const DEFAULT_MAX_TOKENS: i64 = 4096;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// One streamed chunk in the OpenAI `chat.completion.chunk` shape.
///
/// Only the fields the gateway interprets are modelled; everything else in the
/// payload is ignored during deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub delta: Option<ChatDelta>,
}

/// Delta message in streaming chat completions
/// All fields are optional as they may not be present in every chunk
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatDelta {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub reasoning_content: Option<String>,
}

/// Provider-neutral view of one decoded frame.
///
/// Adapters translate their own field conventions into this shape so nothing
/// downstream needs to know which upstream produced the frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameDelta {
    pub content: Option<String>,
    /// Reasoning delivered through a dedicated field
    pub reasoning: Option<String>,
}

impl FrameDelta {
    pub fn content(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            reasoning: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.as_deref().map_or(true, str::is_empty)
            && self.reasoning.as_deref().map_or(true, str::is_empty)
    }
}

/// A classified unit of streamed text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "lowercase")]
pub enum StreamChunk {
    Content(String),
    Reasoning(String),
}

impl StreamChunk {
    pub fn text(&self) -> &str {
        match self {
            StreamChunk::Content(text) | StreamChunk::Reasoning(text) => text,
        }
    }

    pub fn is_reasoning(&self) -> bool {
        matches!(self, StreamChunk::Reasoning(_))
    }
}

#[derive(Debug, Clone, Error)]
pub enum CompletionError {
    #[error("Failed to perform completion: {0}")]
    CompletionError(String),
    #[error("HTTP {status_code}: {message}")]
    HttpError { status_code: u16, message: String },
    #[error("Missing API key for provider {0}")]
    MissingCredential(String),
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),
    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
    #[error("Operation not supported by provider {0}")]
    Unsupported(String),
}

/// Prepaid credit of an upstream account, in the provider's currency unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CreditBalance {
    pub total_credits: f64,
    pub total_usage: f64,
}

impl CreditBalance {
    pub fn remaining(&self) -> f64 {
        self.total_credits - self.total_usage
    }
}
