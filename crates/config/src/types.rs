use serde::Deserialize;
use std::{collections::HashMap, env};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub auth: AuthConfig,
    pub providers: ProvidersConfig,
    pub search: SearchConfig,
    pub chat: ChatConfig,
}

impl ApiConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            server: ServerConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
            auth: AuthConfig::from_env()?,
            providers: ProvidersConfig::from_env()?,
            search: SearchConfig::from_env()?,
            chat: ChatConfig::from_env()?,
        })
    }
}

/// Reads an optional secret, treating an empty value as unset.
fn env_secret(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// Load from environment variables
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| "SERVER_PORT must be a valid port number")?,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Logging Configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub modules: HashMap<String, String>,
}

impl LoggingConfig {
    /// Load from environment variables
    pub fn from_env() -> Result<Self, String> {
        let mut modules = HashMap::new();

        // Load module-specific log levels
        if let Ok(level) = env::var("LOG_MODULE_API") {
            modules.insert("api".to_string(), level);
        }
        if let Ok(level) = env::var("LOG_MODULE_SERVICES") {
            modules.insert("services".to_string(), level);
        }
        if let Ok(level) = env::var("LOG_MODULE_PROVIDERS") {
            modules.insert("inference_providers".to_string(), level);
        }

        Ok(Self {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
            modules,
        })
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        let mut modules = HashMap::new();
        modules.insert("api".to_string(), "debug".to_string());
        modules.insert("services".to_string(), "debug".to_string());

        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            modules,
        }
    }
}

/// Bearer-token authentication.
///
/// Session mechanics live outside this service; the gateway only needs to map
/// an opaque token to a user id.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Token -> user id
    pub tokens: HashMap<String, String>,
}

impl AuthConfig {
    /// Load from environment variables
    ///
    /// `AUTH_TOKENS` holds comma separated `token:user_id` pairs.
    pub fn from_env() -> Result<Self, String> {
        let tokens = match env::var("AUTH_TOKENS") {
            Ok(raw) => parse_token_pairs(&raw)?,
            Err(_) => HashMap::new(),
        };
        Ok(Self { tokens })
    }

    pub fn user_for_token(&self, token: &str) -> Option<&str> {
        self.tokens.get(token).map(String::as_str)
    }
}

fn parse_token_pairs(raw: &str) -> Result<HashMap<String, String>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (token, user) = pair
                .split_once(':')
                .ok_or_else(|| format!("AUTH_TOKENS entry '{pair}' must be token:user_id"))?;
            Ok((token.trim().to_string(), user.trim().to_string()))
        })
        .collect()
}

/// Upstream chat-completion services
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub together: ProviderEndpointConfig,
    pub openrouter: ProviderEndpointConfig,
}

impl ProvidersConfig {
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();
        Ok(Self {
            together: ProviderEndpointConfig {
                base_url: env::var("TOGETHER_BASE_URL").unwrap_or(defaults.together.base_url),
                api_key: env_secret("TOGETHER_API_KEY"),
                timeout_seconds: env_timeout("TOGETHER_TIMEOUT_SECONDS")?,
                extra: HashMap::new(),
            },
            openrouter: ProviderEndpointConfig {
                base_url: env::var("OPENROUTER_BASE_URL")
                    .unwrap_or(defaults.openrouter.base_url),
                api_key: env_secret("OPENROUTER_API_KEY"),
                timeout_seconds: env_timeout("OPENROUTER_TIMEOUT_SECONDS")?,
                extra: [("referer", "OPENROUTER_REFERER"), ("title", "OPENROUTER_TITLE")]
                    .into_iter()
                    .filter_map(|(key, var)| {
                        env::var(var)
                            .ok()
                            .or_else(|| defaults.openrouter.extra.get(key).cloned())
                            .map(|v| (key.to_string(), v))
                    })
                    .collect(),
            },
        })
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            together: ProviderEndpointConfig {
                base_url: "https://api.together.xyz/v1".to_string(),
                ..Default::default()
            },
            openrouter: ProviderEndpointConfig {
                base_url: "https://openrouter.ai/api/v1".to_string(),
                extra: HashMap::from([
                    (
                        "referer".to_string(),
                        "https://satomatashikiaichat.pages.dev".to_string(),
                    ),
                    ("title".to_string(), "Satomata AI Chat".to_string()),
                ]),
                ..Default::default()
            },
        }
    }
}

fn env_timeout(name: &str) -> Result<i64, String> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| format!("{name} must be a number of seconds")),
        Err(_) => Ok(default_timeout_seconds()),
    }
}

fn default_timeout_seconds() -> i64 {
    120
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderEndpointConfig {
    pub base_url: String,
    /// A missing key is reported per request, not at startup
    pub api_key: Option<String>,
    pub timeout_seconds: i64,
    /// Backend-specific settings, e.g. `referer` and `title` for OpenRouter
    pub extra: HashMap<String, String>,
}

impl Default for ProviderEndpointConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: None,
            timeout_seconds: default_timeout_seconds(),
            extra: HashMap::new(),
        }
    }
}

/// Search augmentation services
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub tavily_base_url: String,
    pub tavily_api_key: Option<String>,
    pub perplexity_base_url: String,
    pub perplexity_api_key: Option<String>,
    pub perplexity_model: String,
    /// Web searches allowed per user per calendar month
    pub monthly_quota: i64,
    pub default_max_results: u32,
    pub timeout_seconds: i64,
}

impl SearchConfig {
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();
        Ok(Self {
            tavily_base_url: env::var("TAVILY_BASE_URL").unwrap_or(defaults.tavily_base_url),
            tavily_api_key: env_secret("TAVILY_API_KEY"),
            perplexity_base_url: env::var("PERPLEXITY_BASE_URL")
                .unwrap_or(defaults.perplexity_base_url),
            perplexity_api_key: env_secret("PERPLEXITY_API_KEY"),
            perplexity_model: env::var("PERPLEXITY_MODEL").unwrap_or(defaults.perplexity_model),
            monthly_quota: env::var("SEARCH_MONTHLY_QUOTA")
                .ok()
                .map(|v| v.parse::<i64>())
                .transpose()
                .map_err(|_| "SEARCH_MONTHLY_QUOTA must be a number")?
                .unwrap_or(defaults.monthly_quota),
            default_max_results: env::var("SEARCH_DEFAULT_MAX_RESULTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.default_max_results),
            timeout_seconds: env::var("SEARCH_TIMEOUT_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_seconds),
        })
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            tavily_base_url: "https://api.tavily.com".to_string(),
            tavily_api_key: None,
            perplexity_base_url: "https://api.perplexity.ai".to_string(),
            perplexity_api_key: None,
            perplexity_model: "sonar".to_string(),
            monthly_quota: 1000,
            default_max_results: 5,
            timeout_seconds: 30,
        }
    }
}

/// Chat orchestration behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Provider used when the request does not name one
    pub default_provider: String,
    /// When set, unknown provider identifiers fall back to this provider
    /// instead of being rejected
    pub fallback_provider: Option<String>,
    /// Base system prompt used when the caller supplies no template
    pub default_system_prompt: Option<String>,
    /// Capacity of the per-request outbound event channel
    pub event_buffer: usize,
}

impl ChatConfig {
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();
        Ok(Self {
            default_provider: env::var("CHAT_DEFAULT_PROVIDER")
                .unwrap_or(defaults.default_provider),
            fallback_provider: env::var("CHAT_FALLBACK_PROVIDER").ok(),
            default_system_prompt: env::var("CHAT_DEFAULT_SYSTEM_PROMPT").ok(),
            event_buffer: env::var("CHAT_EVENT_BUFFER")
                .ok()
                .map(|v| v.parse::<usize>())
                .transpose()
                .map_err(|_| "CHAT_EVENT_BUFFER must be a number")?
                .unwrap_or(defaults.event_buffer),
        })
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_provider: "together".to_string(),
            fallback_provider: None,
            default_system_prompt: None,
            event_buffer: 32,
        }
    }
}
