//! Shared plumbing for OpenAI-compatible chat completion endpoints
//!
//! Together AI and OpenRouter both speak OpenAI's `/chat/completions`
//! dialect. The request/response handling lives here; the backends only add
//! their own headers and frame decoding.

use super::backend::BackendConfig;
use crate::{ByteStream, ChatCompletionChunk, ChatCompletionParams, CompletionError, FrameDelta};
use serde::Deserialize;
use futures_util::TryStreamExt;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
};
use std::time::Duration;

/// Build the pooled HTTP client shared by all requests of one backend
pub(crate) fn build_client() -> Client {
    Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Falling back to default HTTP client");
            Client::new()
        })
}

/// `Content-Type` plus bearer authorization
pub(crate) fn bearer_headers(api_key: &str) -> Result<HeaderMap, String> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let auth_value = format!("Bearer {api_key}");
    let header_value =
        HeaderValue::from_str(&auth_value).map_err(|e| format!("Invalid API key format: {e}"))?;
    headers.insert(AUTHORIZATION, header_value);

    Ok(headers)
}

/// `path` below the configured base URL, or below the public endpoint
pub(crate) fn endpoint_url(config: &BackendConfig, default_base_url: &str, path: &str) -> String {
    let base = if config.base_url.trim().is_empty() {
        default_base_url
    } else {
        config.base_url.trim_end_matches('/')
    };
    format!("{base}{path}")
}

pub(crate) fn completions_url(config: &BackendConfig, default_base_url: &str) -> String {
    endpoint_url(config, default_base_url, "/chat/completions")
}

/// POST a streaming completion request and hand back the response body.
///
/// A non-success status is turned into [`CompletionError::HttpError`] with the
/// raw body text; nothing is swallowed here.
pub(crate) async fn post_streaming(
    client: &Client,
    url: &str,
    headers: HeaderMap,
    timeout_seconds: i64,
    params: &ChatCompletionParams,
) -> Result<ByteStream, CompletionError> {
    let mut streaming_params = params.clone();
    streaming_params.stream = true;

    let timeout = Duration::from_secs(timeout_seconds.max(1) as u64);

    let response = client
        .post(url)
        .headers(headers)
        .timeout(timeout)
        .json(&streaming_params)
        .send()
        .await
        .map_err(|e| CompletionError::CompletionError(e.to_string()))?;

    if !response.status().is_success() {
        let status_code = response.status().as_u16();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|e| format!("Failed to read error response body: {e}"));
        return Err(CompletionError::HttpError {
            status_code,
            message: error_text,
        });
    }

    let body = response
        .bytes_stream()
        .map_err(|e| CompletionError::CompletionError(e.to_string()));
    Ok(Box::pin(body))
}

/// Decode a frame in the OpenAI `chat.completion.chunk` shape.
///
/// Only the first choice is read. `reasoning_content` (DeepSeek style) wins
/// over the normalized `reasoning` field when both carry text.
pub fn decode_openai_frame(frame: &serde_json::Value) -> FrameDelta {
    let chunk = ChatCompletionChunk::deserialize(frame).unwrap_or_default();
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
