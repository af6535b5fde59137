//! Inference providers crate for streaming chat completion services
//!
//! This crate provides a streaming-first trait interface for upstream chat
//! providers together with the decoding pipeline that turns their raw
//! Server-Sent Events bodies into classified text chunks.
//!
//! # Pipeline
//!
//! ```text
//! bytes ─▶ LineReassembler ─▶ frame decoder ─▶ provider FrameDecoder ─▶ ReasoningSplitter ─▶ StreamChunk
//! ```
//!
//! Every stage is per request and holds no shared state.
//!
//! # Usage
//!
//! ```rust,ignore
//! use futures_util::StreamExt;
//! use inference_providers::{classify_stream, GenerationRequest, InferenceProvider, StreamChunk};
//!
//! async fn example<P: InferenceProvider>(provider: P, request: GenerationRequest) {
//!     let body = provider.chat_completion_stream(request).await?;
//!     let mut chunks = classify_stream(body, provider.frame_decoder());
//!     while let Some(chunk) = chunks.next().await {
//!         match chunk {
//!             Ok(StreamChunk::Reasoning(text)) => println!("thinking: {text}"),
//!             Ok(StreamChunk::Content(text)) => print!("{text}"),
//!             Err(e) => eprintln!("Stream error: {e}"),
//!         }
//!     }
//! }
//! ```

pub mod chunk_stream;
pub mod external;
pub mod mock;
pub mod models;
pub mod prompt;
pub mod reasoning;
pub mod sse_parser;

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;

// Re-export commonly used types for convenience
pub use chunk_stream::ChunkStream;
pub use mock::{MockProvider, RequestMatcher, ResponseTemplate};
pub use models::{
    ChatChoice, ChatCompletionChunk, ChatCompletionParams, ChatDelta, ChatMessage,
    CompletionError, CreditBalance, FrameDelta, GenerationRequest, MessageRole, SearchResult,
    StreamChunk, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE,
};
pub use reasoning::{ParserState, ReasoningSplitter};
pub use sse_parser::{new_sse_parser, FrameStream, LineReassembler};

// External provider exports
pub use external::{
    select_provider, ExternalProvider, ExternalProviderConfig, OpenRouterBackend, ProviderKind,
    TogetherBackend,
};

/// Raw upstream response body
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, CompletionError>> + Send>>;

/// Classified chunks of one generation
pub type StreamingResult = Pin<Box<dyn Stream<Item = Result<StreamChunk, CompletionError>> + Send>>;

/// Translates one decoded upstream frame into the provider-neutral delta
pub type FrameDecoder = fn(&serde_json::Value) -> FrameDelta;

#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Identifier of the upstream service (e.g. "together")
    fn provider_name(&self) -> &str;

    /// Model used when the request leaves the model blank
    fn default_model(&self) -> &str;

    /// Performs a streaming chat completion request
    ///
    /// The synthesized system message is prepended to the request's
    /// conversation. Returns the raw response body; a non-success status is
    /// reported as [`CompletionError::HttpError`] before any byte is
    /// returned.
    async fn chat_completion_stream(
        &self,
        request: GenerationRequest,
    ) -> Result<ByteStream, CompletionError>;

    /// Decoder for this provider's frame format
    fn frame_decoder(&self) -> FrameDecoder;

    fn decode_frame(&self, frame: &serde_json::Value) -> FrameDelta {
        (self.frame_decoder())(frame)
    }

    /// Remaining prepaid credit of the account behind `api_key`
    async fn credit_balance(&self, _api_key: &str) -> Result<CreditBalance, CompletionError> {
        Err(CompletionError::Unsupported(self.provider_name().to_string()))
    }
}

/// Run a raw provider body through reassembly, frame decoding and
/// reasoning/content classification
pub fn classify_stream(body: ByteStream, decoder: FrameDecoder) -> StreamingResult {
    Box::pin(ChunkStream::new(body, decoder))
}
