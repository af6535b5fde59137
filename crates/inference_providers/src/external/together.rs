//! Together AI backend
//!
//! Together serves open-weight models through an OpenAI-compatible endpoint.
//! Reasoning models either wrap their deliberation in inline `<think>` tags or
//! send it in a `reasoning_content` (DeepSeek-R1) or `reasoning` delta field.

use super::backend::{BackendConfig, ExternalBackend};
use super::openai_compatible::{bearer_headers, build_client, completions_url, post_streaming};
use crate::{ByteStream, ChatCompletionParams, CompletionError, FrameDecoder, FrameDelta};
use async_trait::async_trait;
use reqwest::{header::HeaderMap, Client};
use serde::Deserialize;

pub const TOGETHER_BASE_URL: &str = "https://api.together.xyz/v1";
pub const TOGETHER_DEFAULT_MODEL: &str = "meta-llama/Llama-3.3-70B-Instruct-Turbo";

#[derive(Debug, Default, Deserialize)]
struct TogetherChunk {
    #[serde(default)]
    choices: Vec<TogetherChoice>,
}

#[derive(Debug, Default, Deserialize)]
struct TogetherChoice {
    #[serde(default)]
    delta: Option<TogetherDelta>,
}

#[derive(Debug, Default, Deserialize)]
struct TogetherDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning_content: Option<String>,
    #[serde(default)]
    reasoning: Option<String>,
}

/// Decode one Together frame. Only the first choice is read.
pub fn decode_together_frame(frame: &serde_json::Value) -> FrameDelta {
    let chunk = TogetherChunk::deserialize(frame).unwrap_or_default();
    let Some(delta) = chunk.choices.into_iter().next().and_then(|c| c.delta) else {
        return FrameDelta::default();
    };

    let reasoning = delta
        .reasoning_content
        .filter(|r| !r.is_empty())
        .or(delta.reasoning.filter(|r| !r.is_empty()));

    FrameDelta {
        content: delta.content,
        reasoning,
    }
}

pub struct TogetherBackend {
    client: Client,
}

impl TogetherBackend {
    pub fn new() -> Self {
        Self {
            client: build_client(),
        }
    }
}

impl Default for TogetherBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExternalBackend for TogetherBackend {
    fn backend_type(&self) -> &'static str {
        "together"
    }

    fn default_model(&self) -> &'static str {
        TOGETHER_DEFAULT_MODEL
    }

    fn default_base_url(&self) -> &'static str {
        TOGETHER_BASE_URL
    }

    fn build_headers(
        &self,
        _config: &BackendConfig,
        api_key: &str,
    ) -> Result<HeaderMap, String> {
        bearer_headers(api_key)
    }

    async fn chat_completion_stream(
        &self,
        config: &BackendConfig,
        api_key: &str,
        params: ChatCompletionParams,
    ) -> Result<ByteStream, CompletionError> {
        let url = completions_url(config, self.default_base_url());
        let headers = self
            .build_headers(config, api_key)
            .map_err(CompletionError::CompletionError)?;

        tracing::debug!(model = %params.model, "Sending streaming request to Together");
        post_streaming(&self.client, &url, headers, config.timeout_seconds, &params).await
    }

    fn frame_decoder(&self) -> FrameDecoder {
        decode_together_frame
    }
}
