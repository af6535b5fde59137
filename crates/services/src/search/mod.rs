//! Search augmentation
//!
//! Two modes: a web search whose results are merged into the prompt (metered
//! by a monthly per-user quota) and an answer engine whose response replaces
//! generation. Search failures never abort a chat; they degrade to "no
//! results". Only the quota can reject a request.

pub mod perplexity;
pub mod ports;
pub mod tavily;

pub use perplexity::PerplexityAnswerEngine;
pub use ports::{
    AnswerEngineTrait, QuotaError, SearchError, SearchQuotaRepository, WebSearchProviderTrait,
};
pub use tavily::TavilyWebSearchProvider;

use crate::UserId;
use chrono::{Datelike, Utc};
use inference_providers::SearchResult;
use serde::Serialize;
use std::sync::Arc;

pub const MIN_SEARCH_RESULTS: u32 = 1;
pub const MAX_SEARCH_RESULTS: u32 = 20;

/// Credentials and limits for the search services
#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub tavily_api_key: Option<String>,
    pub perplexity_api_key: Option<String>,
    pub monthly_quota: i64,
    pub default_max_results: u32,
}

impl From<&config::SearchConfig> for SearchSettings {
    fn from(config: &config::SearchConfig) -> Self {
        Self {
            tavily_api_key: config.tavily_api_key.clone(),
            perplexity_api_key: config.perplexity_api_key.clone(),
            monthly_quota: config.monthly_quota,
            default_max_results: config.default_max_results,
        }
    }
}

/// Results of one metered web search
#[derive(Debug, Clone, Default)]
pub struct WebSearchOutcome {
    pub results: Vec<SearchResult>,
    /// Allowance left this month; `None` when no search was charged
    pub remaining: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchUsage {
    pub period: String,
    pub used: i64,
    pub limit: i64,
    pub remaining: i64,
}

/// Quota period key for the current calendar month (UTC)
pub fn current_period() -> String {
    let now = Utc::now();
    format!("{:04}-{:02}", now.year(), now.month())
}

/// Requested result count, defaulted and clamped to the supported range
pub fn clamp_max_results(requested: Option<u32>, default: u32) -> u32 {
    requested
        .unwrap_or(default)
        .clamp(MIN_SEARCH_RESULTS, MAX_SEARCH_RESULTS)
}

fn configured_key(key: &Option<String>) -> Option<&str> {
    key.as_deref().map(str::trim).filter(|k| !k.is_empty())
}

pub struct SearchAugmentor {
    web: Arc<dyn WebSearchProviderTrait>,
    answer_engine: Arc<dyn AnswerEngineTrait>,
    quota_repository: Arc<dyn SearchQuotaRepository>,
    settings: SearchSettings,
}

impl SearchAugmentor {
    pub fn new(
        web: Arc<dyn WebSearchProviderTrait>,
        answer_engine: Arc<dyn AnswerEngineTrait>,
        quota_repository: Arc<dyn SearchQuotaRepository>,
        settings: SearchSettings,
    ) -> Self {
        Self {
            web,
            answer_engine,
            quota_repository,
            settings,
        }
    }

    /// Metered web search.
    ///
    /// The quota is checked and charged before the search service is called;
    /// an exhausted quota fails without any network traffic. A missing API key
    /// skips the search without charging.
    pub async fn web_search(
        &self,
        user_id: &UserId,
        query: &str,
        max_results: Option<u32>,
    ) -> Result<WebSearchOutcome, QuotaError> {
        let Some(api_key) = configured_key(&self.settings.tavily_api_key) else {
            tracing::warn!("Web search requested but no Tavily API key is configured");
            return Ok(WebSearchOutcome::default());
        };

        let limit = self.settings.monthly_quota;
        let remaining = self
            .quota_repository
            .increment_and_check(user_id, &current_period(), limit)
            .await
            .map_err(|e| QuotaError::Repository(e.to_string()))?
            .ok_or(QuotaError::Exceeded { limit })?;

        let max_results = clamp_max_results(max_results, self.settings.default_max_results);
        let results = match self.web.search(query, api_key, max_results).await {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Web search failed, continuing without results");
                Vec::new()
            }
        };

        Ok(WebSearchOutcome {
            results,
            remaining: Some(remaining),
        })
    }

    /// Answer-engine lookup. Empty on any failure.
    pub async fn answer(&self, query: &str) -> Vec<SearchResult> {
        let Some(api_key) = configured_key(&self.settings.perplexity_api_key) else {
            tracing::warn!("Answer engine requested but no Perplexity API key is configured");
            return Vec::new();
        };

        match self.answer_engine.answer(query, api_key).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "Answer engine failed");
                Vec::new()
            }
        }
    }

    pub async fn usage(&self, user_id: &UserId) -> Result<SearchUsage, QuotaError> {
        let period = current_period();
        let used = self
            .quota_repository
            .used(user_id, &period)
            .await
            .map_err(|e| QuotaError::Repository(e.to_string()))?;
        let limit = self.settings.monthly_quota;

        Ok(SearchUsage {
            period,
            used,
            limit,
            remaining: (limit - used).max(0),
        })
    }
}
