//! Provider registry
//!
//! Maps provider identifiers to adapter instances and their credentials.
//! Built once at startup from configuration; immutable afterwards.

use config::{ChatConfig, ProviderEndpointConfig, ProvidersConfig};
use inference_providers::{
    select_provider, CompletionError, CreditBalance, ExternalProvider, ExternalProviderConfig,
    InferenceProvider, ProviderKind,
};
use regex::Regex;
use std::{
    collections::HashMap,
    sync::{Arc, LazyLock},
};

type InferenceProviderTrait = dyn InferenceProvider + Send + Sync;

static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s)]+").expect("valid URL pattern"));
static IP_PORT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:[0-9]{1,3}\.){3}[0-9]{1,3}:\d+\b").expect("valid IP:port pattern")
});
static IP_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:[0-9]{1,3}\.){3}[0-9]{1,3}\b").expect("valid IP pattern")
});

/// A provider ready to serve one request
#[derive(Clone)]
pub struct ResolvedProvider {
    pub kind: ProviderKind,
    pub provider: Arc<InferenceProviderTrait>,
    pub api_key: Option<String>,
}

struct ProviderEntry {
    provider: Arc<InferenceProviderTrait>,
    api_key: Option<String>,
}

pub struct InferenceProviderPool {
    providers: HashMap<ProviderKind, ProviderEntry>,
    default_kind: ProviderKind,
    fallback: Option<ProviderKind>,
}

impl InferenceProviderPool {
    /// Create an empty pool
    pub fn new(default_kind: ProviderKind, fallback: Option<ProviderKind>) -> Self {
        Self {
            providers: HashMap::new(),
            default_kind,
            fallback,
        }
    }

    /// Build the pool with one external provider per supported service
    pub fn from_config(
        providers: &ProvidersConfig,
        chat: &ChatConfig,
    ) -> Result<Self, CompletionError> {
        let default_kind = chat.default_provider.parse::<ProviderKind>()?;
        let fallback = chat
            .fallback_provider
            .as_deref()
            .map(str::parse::<ProviderKind>)
            .transpose()?;

        let mut pool = Self::new(default_kind, fallback);
        for kind in ProviderKind::ALL {
            let endpoint = match kind {
                ProviderKind::Together => &providers.together,
                ProviderKind::OpenRouter => &providers.openrouter,
            };
            pool.register_provider(
                kind,
                Arc::new(ExternalProvider::new(external_config(kind, endpoint))),
                endpoint.api_key.clone(),
            );
        }

        tracing::info!(
            default = %default_kind,
            fallback = ?fallback.map(|k| k.as_str()),
            "Provider pool initialized"
        );
        Ok(pool)
    }

    /// Register a provider manually (useful for testing with mock providers)
    pub fn register_provider(
        &mut self,
        kind: ProviderKind,
        provider: Arc<InferenceProviderTrait>,
        api_key: Option<String>,
    ) {
        let api_key = api_key.filter(|k| !k.trim().is_empty());
        self.providers
            .insert(kind, ProviderEntry { provider, api_key });
    }

    /// Resolve a provider identifier; `None` selects the configured default
    pub fn resolve(&self, identifier: Option<&str>) -> Result<ResolvedProvider, CompletionError> {
        let kind = match identifier.map(str::trim).filter(|i| !i.is_empty()) {
            Some(identifier) => select_provider(identifier, self.fallback)?,
            None => self.default_kind,
        };

        let entry = self
            .providers
            .get(&kind)
            .ok_or_else(|| CompletionError::UnknownProvider(kind.to_string()))?;

        Ok(ResolvedProvider {
            kind,
            provider: entry.provider.clone(),
            api_key: entry.api_key.clone(),
        })
    }

    /// Account balance of a named provider.
    ///
    /// The fallback never applies here; asking for an unknown provider's
    /// balance is an error.
    pub async fn credit_balance(&self, identifier: &str) -> Result<CreditBalance, CompletionError> {
        let kind = identifier.parse::<ProviderKind>()?;
        let entry = self
            .providers
            .get(&kind)
            .ok_or_else(|| CompletionError::UnknownProvider(kind.to_string()))?;
        let api_key = entry
            .api_key
            .as_deref()
            .ok_or_else(|| CompletionError::MissingCredential(kind.to_string()))?;

        entry.provider.credit_balance(api_key).await
    }

    /// Strip URLs and addresses from an upstream error before it reaches a client
    pub fn sanitize_error_message(error: &str) -> String {
        let sanitized = URL_REGEX.replace_all(error, "[URL_REDACTED]");
        let sanitized = IP_PORT_REGEX.replace_all(&sanitized, "[IP_REDACTED]");
        let sanitized = IP_REGEX.replace_all(&sanitized, "[IP_REDACTED]");

        sanitized.replace(
            "error sending request for url",
            "provider connection failed",
        )
    }
}

fn external_config(kind: ProviderKind, endpoint: &ProviderEndpointConfig) -> ExternalProviderConfig {
    ExternalProviderConfig {
        kind,
        base_url: endpoint.base_url.clone(),
        timeout_seconds: endpoint.timeout_seconds,
        extra: endpoint.extra.clone(),
    }
}
