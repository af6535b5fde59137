//! External provider module for third-party chat completion services
//!
//! This module provides a unified `ExternalProvider` that puts the supported
//! upstream services behind a single implementation of the
//! `InferenceProvider` trait.
//!
//! # Architecture
//!
//! ```text
//! ExternalProvider (implements InferenceProvider)
//!     └── backends:
//!         ├── TogetherBackend
//!         └── OpenRouterBackend
//! ```
//!
//! # Adding New Providers
//!
//! Add a `ProviderKind` variant and a backend file implementing
//! `ExternalBackend`. The backend owns its request headers and the decoding
//! of its own frame format.

pub mod backend;
pub mod openai_compatible;
pub mod openrouter;
pub mod together;

use crate::{
    prompt, ByteStream, ChatCompletionParams, CompletionError, CreditBalance, FrameDecoder,
    GenerationRequest, InferenceProvider, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE,
};
use async_trait::async_trait;
use backend::{BackendConfig, ExternalBackend};
use std::{collections::HashMap, fmt, str::FromStr, sync::Arc};

pub use backend::BackendConfig as ExternalBackendConfig;
pub use openai_compatible::decode_openai_frame;
pub use openrouter::OpenRouterBackend;
pub use together::{decode_together_frame, TogetherBackend};

/// Supported upstream services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Together,
    OpenRouter,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Together, ProviderKind::OpenRouter];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Together => "together",
            ProviderKind::OpenRouter => "openrouter",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Together => together::TOGETHER_DEFAULT_MODEL,
            ProviderKind::OpenRouter => openrouter::OPENROUTER_DEFAULT_MODEL,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = CompletionError;

    /// Case-insensitive; surrounding whitespace is ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "together" | "togetherai" | "together_ai" => Ok(ProviderKind::Together),
            "openrouter" | "open_router" => Ok(ProviderKind::OpenRouter),
            _ => Err(CompletionError::UnknownProvider(s.to_string())),
        }
    }
}

/// Map a provider identifier to a [`ProviderKind`].
///
/// Unknown identifiers are an error unless a fallback is configured, in which
/// case the fallback is used and the substitution is logged.
pub fn select_provider(
    identifier: &str,
    fallback: Option<ProviderKind>,
) -> Result<ProviderKind, CompletionError> {
    match identifier.parse::<ProviderKind>() {
        Ok(kind) => Ok(kind),
        Err(err) => match fallback {
            Some(kind) => {
                tracing::warn!(
                    requested = %identifier,
                    fallback = %kind,
                    "Unknown provider requested, using configured fallback"
                );
                Ok(kind)
            }
            None => Err(err),
        },
    }
}

/// Configuration for an external provider
#[derive(Debug, Clone)]
pub struct ExternalProviderConfig {
    pub kind: ProviderKind,
    /// Blank means the backend's public endpoint
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: i64,
    pub extra: HashMap<String, String>,
}

impl ExternalProviderConfig {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            base_url: String::new(),
            timeout_seconds: BackendConfig::default().timeout_seconds,
            extra: HashMap::new(),
        }
    }
}

/// External provider facade
///
/// Implements `InferenceProvider` by delegating to the backend selected by
/// the provider kind.
pub struct ExternalProvider {
    backend: Arc<dyn ExternalBackend>,
    config: BackendConfig,
    kind: ProviderKind,
}

impl ExternalProvider {
    pub fn new(external_config: ExternalProviderConfig) -> Self {
        let ExternalProviderConfig {
            kind,
            base_url,
            timeout_seconds,
            extra,
        } = external_config;

        let backend: Arc<dyn ExternalBackend> = match kind {
            ProviderKind::Together => Arc::new(TogetherBackend::new()),
            ProviderKind::OpenRouter => Arc::new(OpenRouterBackend::new()),
        };

        Self {
            backend,
            config: BackendConfig {
                base_url,
                timeout_seconds,
                extra,
            },
            kind,
        }
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub fn backend_type(&self) -> &'static str {
        self.backend.backend_type()
    }
}

#[async_trait]
impl InferenceProvider for ExternalProvider {
    fn provider_name(&self) -> &str {
        self.backend.backend_type()
    }

    fn default_model(&self) -> &str {
        self.backend.default_model()
    }

    async fn chat_completion_stream(
        &self,
        request: GenerationRequest,
    ) -> Result<ByteStream, CompletionError> {
        if request.api_key.trim().is_empty() {
            return Err(CompletionError::MissingCredential(
                self.backend.backend_type().to_string(),
            ));
        }

        let model = if request.model.trim().is_empty() {
            self.backend.default_model().to_string()
        } else {
            request.model
        };

        let messages = prompt::build_messages(
            &request.messages,
            request.system_prompt.as_deref(),
            request.search_results.as_deref(),
        );

        let params = ChatCompletionParams {
            model,
            messages,
            stream: true,
            max_tokens: Some(DEFAULT_MAX_TOKENS),
            temperature: Some(DEFAULT_TEMPERATURE),
        };

        self.backend
            .chat_completion_stream(&self.config, &request.api_key, params)
            .await
    }

    fn frame_decoder(&self) -> FrameDecoder {
        self.backend.frame_decoder()
    }

    async fn credit_balance(&self, api_key: &str) -> Result<CreditBalance, CompletionError> {
        if api_key.trim().is_empty() {
            return Err(CompletionError::MissingCredential(
                self.backend.backend_type().to_string(),
            ));
        }
        self.backend.credit_balance(&self.config, api_key).await
    }
}
