//! Mock implementation of InferenceProvider for testing
//!
//! This module provides a mock provider that produces realistic upstream SSE
//! bodies without any network access. Responses are scripted with
//! [`ResponseTemplate`] and can be made conditional with [`RequestMatcher`].

use crate::{
    external::decode_openai_frame, ByteStream, CompletionError, CreditBalance, FrameDecoder,
    GenerationRequest, MessageRole,
};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream;
use serde_json::json;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tokio::sync::Mutex;

/// Request matcher for conditional responses
#[derive(Clone, Debug)]
pub enum RequestMatcher {
    /// Match any request
    Any,
    /// Match requests whose last user message equals the text exactly
    LastUserMessage(String),
    /// Match requests whose system prompt contains the text
    SystemPromptContains(String),
}

impl RequestMatcher {
    pub fn matches(&self, request: &GenerationRequest) -> bool {
        match self {
            Self::Any => true,
            Self::LastUserMessage(text) => request
                .messages
                .iter()
                .rev()
                .find(|m| m.role == MessageRole::User)
                .is_some_and(|m| &m.content == text),
            Self::SystemPromptContains(text) => request
                .system_prompt
                .as_deref()
                .is_some_and(|p| p.contains(text.as_str())),
        }
    }
}

/// Template for generating responses
#[derive(Clone, Debug)]
pub struct ResponseTemplate {
    content: String,
    /// Sent through the `reasoning_content` delta field
    reasoning: Option<String>,
    /// Sent inline as `<think>...</think>` ahead of the content
    inline_reasoning: Option<String>,
    /// Fail before streaming with this status and body
    http_error: Option<(u16, String)>,
    /// Emit a transport error after N frames
    error_after_frames: Option<usize>,
    /// Stop after N frames without the `[DONE]` sentinel
    truncate_after_frames: Option<usize>,
    /// Re-chunk the body into reads of this many bytes
    read_size: Option<usize>,
}

impl ResponseTemplate {
    /// Create a new response template with the given content
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            reasoning: None,
            inline_reasoning: None,
            http_error: None,
            error_after_frames: None,
            truncate_after_frames: None,
            read_size: None,
        }
    }

    /// Set reasoning content delivered through the dedicated delta field
    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }

    /// Wrap reasoning in inline think tags before the content
    pub fn with_inline_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.inline_reasoning = Some(reasoning.into());
        self
    }

    /// Reject the request with an HTTP status before any byte is streamed
    pub fn with_http_error(mut self, status_code: u16, body: impl Into<String>) -> Self {
        self.http_error = Some((status_code, body.into()));
        self
    }

    /// Simulate the upstream connection dying after N frames
    pub fn with_error_after(mut self, frames: usize) -> Self {
        self.error_after_frames = Some(frames);
        self
    }

    /// End the body after N frames, without `[DONE]`
    pub fn with_truncate_after(mut self, frames: usize) -> Self {
        self.truncate_after_frames = Some(frames);
        self
    }

    /// Deliver the body in fixed-size reads regardless of line boundaries
    pub fn with_read_size(mut self, bytes: usize) -> Self {
        self.read_size = Some(bytes.max(1));
        self
    }

    /// Stream word by word (split by spaces) for more realistic tokenization
    fn generate_frames(&self, model: &str) -> Vec<serde_json::Value> {
        let mut frames = Vec::new();

        let frame = |delta: serde_json::Value| {
            json!({
                "id": "chatcmpl-mock",
                "object": "chat.completion.chunk",
                "model": model,
                "choices": [{"index": 0, "delta": delta, "finish_reason": null}]
            })
        };

        if let Some(reasoning) = &self.reasoning {
            for word in split_words(reasoning) {
                frames.push(frame(json!({ "reasoning_content": word })));
            }
        }

        let mut content = self.content.clone();
        if let Some(inline) = &self.inline_reasoning {
            content = format!("<think>{inline}</think>{content}");
        }
        for word in split_words(&content) {
            frames.push(frame(json!({ "content": word })));
        }

        frames.push(json!({
            "id": "chatcmpl-mock",
            "object": "chat.completion.chunk",
            "model": model,
            "choices": [{"index": 0, "delta": {}, "finish_reason": "stop"}]
        }));

        frames
    }

    fn generate_body(&self, model: &str) -> Vec<Result<Bytes, CompletionError>> {
        let mut frames = self.generate_frames(model);

        let cut = self.error_after_frames.or(self.truncate_after_frames);
        if let Some(n) = cut {
            frames.truncate(n);
        }

        let mut body = String::new();
        for frame in &frames {
            body.push_str(&format!("data: {frame}\n\n"));
        }
        if cut.is_none() {
            body.push_str("data: [DONE]\n\n");
        }

        let bytes = body.into_bytes();
        let mut reads: Vec<Result<Bytes, CompletionError>> = match self.read_size {
            Some(size) => bytes
                .chunks(size)
                .map(|c| Ok(Bytes::copy_from_slice(c)))
                .collect(),
            None => vec![Ok(Bytes::from(bytes))],
        };

        if self.error_after_frames.is_some() {
            reads.push(Err(CompletionError::CompletionError(
                "upstream connection reset".to_string(),
            )));
        }
        reads
    }
}

fn split_words(text: &str) -> Vec<String> {
    text.split(' ')
        .enumerate()
        .map(|(i, w)| if i == 0 { w.to_string() } else { format!(" {w}") })
        .filter(|w| !w.is_empty())
        .collect()
}

/// Configuration for a single expectation
struct MockExpectation {
    matcher: RequestMatcher,
    response: ResponseTemplate,
}

struct MockConfig {
    expectations: Vec<MockExpectation>,
    default_response: ResponseTemplate,
}

/// Builder for configuring a single expectation
pub struct MockExpectationBuilder {
    config: Arc<Mutex<MockConfig>>,
    matcher: RequestMatcher,
}

impl MockExpectationBuilder {
    /// Set the response for this expectation
    pub async fn respond_with(self, response: ResponseTemplate) {
        let mut config = self.config.lock().await;
        config.expectations.push(MockExpectation {
            matcher: self.matcher,
            response,
        });
    }
}

/// Mock provider that implements InferenceProvider for testing
pub struct MockProvider {
    name: String,
    config: Arc<Mutex<MockConfig>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<GenerationRequest>>,
    credits: Mutex<Option<CreditBalance>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::with_name("mock")
    }

    /// Mock answering under a given provider name
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: Arc::new(Mutex::new(MockConfig {
                expectations: Vec::new(),
                default_response: ResponseTemplate::new("1. 2. 3."),
            })),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            credits: Mutex::new(None),
        }
    }

    /// Add a conditional response for a specific matcher
    pub fn when(&self, matcher: RequestMatcher) -> MockExpectationBuilder {
        MockExpectationBuilder {
            config: self.config.clone(),
            matcher,
        }
    }

    /// Set the default response for requests that don't match any expectation
    pub async fn set_default_response(&self, response: ResponseTemplate) {
        let mut config = self.config.lock().await;
        config.default_response = response;
    }

    /// Report this balance from `credit_balance`; unsupported otherwise
    pub async fn set_credit_balance(&self, balance: CreditBalance) {
        *self.credits.lock().await = Some(balance);
    }

    /// Number of generation requests received so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Most recent generation request, if any
    pub async fn last_request(&self) -> Option<GenerationRequest> {
        self.requests.lock().await.last().cloned()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl crate::InferenceProvider for MockProvider {
    fn provider_name(&self) -> &str {
        &self.name
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    async fn chat_completion_stream(
        &self,
        request: GenerationRequest,
    ) -> Result<ByteStream, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if request.api_key.trim().is_empty() {
            return Err(CompletionError::MissingCredential(self.name.clone()));
        }

        let template = {
            let config = self.config.lock().await;
            config
                .expectations
                .iter()
                .find(|exp| exp.matcher.matches(&request))
                .map(|exp| exp.response.clone())
                .unwrap_or_else(|| config.default_response.clone())
        };

        let model = if request.model.is_empty() {
            self.default_model().to_string()
        } else {
            request.model.clone()
        };
        self.requests.lock().await.push(request);

        if let Some((status_code, message)) = template.http_error {
            return Err(CompletionError::HttpError {
                status_code,
                message,
            });
        }

        Ok(Box::pin(stream::iter(template.generate_body(&model))))
    }

    fn frame_decoder(&self) -> FrameDecoder {
        decode_openai_frame
    }

    async fn credit_balance(&self, api_key: &str) -> Result<CreditBalance, CompletionError> {
        if api_key.trim().is_empty() {
            return Err(CompletionError::MissingCredential(self.name.clone()));
        }
        (*self.credits.lock().await).ok_or_else(|| CompletionError::Unsupported(self.name.clone()))
    }
}
