//! Backend trait for external provider implementations
//!
//! This module defines the internal abstraction for different upstream chat
//! services. Each backend handles authentication, the request shape and the
//! translation of its own frame format into [`FrameDelta`].

use crate::{ByteStream, ChatCompletionParams, CompletionError, CreditBalance, FrameDecoder};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use std::collections::HashMap;

/// Configuration for a backend connection
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL for the provider API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: i64,
    /// Provider-specific extra configuration (e.g., referer, title)
    pub extra: HashMap<String, String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_seconds: 120,
            extra: HashMap::new(),
        }
    }
}

/// Internal backend trait for different upstream services
#[async_trait]
pub trait ExternalBackend: Send + Sync {
    /// Returns the backend type identifier (e.g., "together", "openrouter")
    fn backend_type(&self) -> &'static str;

    /// Model used when the caller does not pick one
    fn default_model(&self) -> &'static str;

    /// Base URL used when the configuration leaves it blank
    fn default_base_url(&self) -> &'static str;

    /// Request headers including authentication
    fn build_headers(&self, config: &BackendConfig, api_key: &str)
        -> Result<HeaderMap, String>;

    /// Performs a streaming chat completion request and returns the raw body
    async fn chat_completion_stream(
        &self,
        config: &BackendConfig,
        api_key: &str,
        params: ChatCompletionParams,
    ) -> Result<ByteStream, CompletionError>;

    /// Translates one decoded frame of this backend's stream
    fn frame_decoder(&self) -> FrameDecoder;

    /// Account balance lookup; most services have none
    async fn credit_balance(
        &self,
        _config: &BackendConfig,
        _api_key: &str,
    ) -> Result<CreditBalance, CompletionError> {
        Err(CompletionError::Unsupported(self.backend_type().to_string()))
    }
}
