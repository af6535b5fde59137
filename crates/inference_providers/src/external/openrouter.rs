//! OpenRouter backend
//!
//! OpenRouter proxies many upstream vendors behind the OpenAI dialect, so its
//! frames are decoded with the plain OpenAI delta decoder.

use super::backend::{BackendConfig, ExternalBackend};
use super::openai_compatible::{
    bearer_headers, build_client, completions_url, decode_openai_frame, endpoint_url,
    post_streaming,
};
use crate::{ByteStream, ChatCompletionParams, CompletionError, CreditBalance, FrameDecoder};
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use serde::Deserialize;
use std::time::Duration;

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const OPENROUTER_DEFAULT_MODEL: &str = "google/gemini-2.5-flash-preview";

/// Extra config keys for the attribution headers OpenRouter asks for
pub const EXTRA_REFERER: &str = "referer";
pub const EXTRA_TITLE: &str = "title";

/// Body of `GET /credits`
#[derive(Debug, Default, Deserialize)]
struct CreditsResponse {
    #[serde(default)]
    data: Option<CreditsData>,
}

#[derive(Debug, Default, Deserialize)]
struct CreditsData {
    #[serde(default)]
    total_credits: Option<f64>,
    #[serde(default)]
    total_usage: Option<f64>,
}

pub struct OpenRouterBackend {
    client: Client,
}

impl OpenRouterBackend {
    pub fn new() -> Self {
        Self {
            client: build_client(),
        }
    }
}

impl Default for OpenRouterBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExternalBackend for OpenRouterBackend {
    fn backend_type(&self) -> &'static str {
        "openrouter"
    }

    fn default_model(&self) -> &'static str {
        OPENROUTER_DEFAULT_MODEL
    }

    fn default_base_url(&self) -> &'static str {
        OPENROUTER_BASE_URL
    }

    fn build_headers(&self, config: &BackendConfig, api_key: &str) -> Result<HeaderMap, String> {
        let mut headers = bearer_headers(api_key)?;

        if let Some(referer) = config.extra.get(EXTRA_REFERER) {
            let value = HeaderValue::from_str(referer)
                .map_err(|e| format!("Invalid referer header: {e}"))?;
            headers.insert("HTTP-Referer", value);
        }
        if let Some(title) = config.extra.get(EXTRA_TITLE) {
            let value =
                HeaderValue::from_str(title).map_err(|e| format!("Invalid title header: {e}"))?;
            headers.insert("X-Title", value);
        }

        Ok(headers)
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

        tracing::debug!(model = %params.model, "Sending streaming request to OpenRouter");
        post_streaming(&self.client, &url, headers, config.timeout_seconds, &params).await
    }

    fn frame_decoder(&self) -> FrameDecoder {
        decode_openai_frame
    }

    async fn credit_balance(
        &self,
        config: &BackendConfig,
        api_key: &str,
    ) -> Result<CreditBalance, CompletionError> {
        let url = endpoint_url(config, self.default_base_url(), "/credits");
        let headers = bearer_headers(api_key).map_err(CompletionError::CompletionError)?;

        let response = self
            .client
            .get(&url)
            .headers(headers)
            .timeout(Duration::from_secs(config.timeout_seconds.max(1) as u64))
            .send()
            .await
            .map_err(|e| CompletionError::CompletionError(e.to_string()))?;

        if !response.status().is_success() {
            let status_code = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|e| format!("Failed to read error response body: {e}"));
            return Err(CompletionError::HttpError {
                status_code,
                message,
            });
        }

        let body: CreditsResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::InvalidResponse(e.to_string()))?;
        let data = body.data.unwrap_or_default();

        Ok(CreditBalance {
            total_credits: data.total_credits.unwrap_or(0.0),
            total_usage: data.total_usage.unwrap_or(0.0),
        })
    }
}
