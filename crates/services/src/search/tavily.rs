pub use super::ports::*;
use inference_providers::SearchResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const TAVILY_BASE_URL: &str = "https://api.tavily.com";

pub struct TavilyWebSearchProvider {
    base_url: String,
    client: reqwest::Client,
}

impl TavilyWebSearchProvider {
    pub fn new(base_url: impl Into<String>, timeout_seconds: i64) -> Self {
        let base_url = base_url.into();
        let base_url = if base_url.trim().is_empty() {
            TAVILY_BASE_URL.to_string()
        } else {
            base_url.trim_end_matches('/').to_string()
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds.max(1) as u64))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });

        Self { base_url, client }
    }
}

#[derive(Debug, Serialize)]
struct TavilySearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: &'a str,
    max_results: u32,
}

/// Root response from the Tavily search API
#[derive(Debug, Clone, Deserialize)]
pub struct TavilySearchResponse {
    #[serde(default)]
    pub results: Vec<TavilySearchResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TavilySearchResult {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub content: String,
}

#[async_trait::async_trait]
impl WebSearchProviderTrait for TavilyWebSearchProvider {
    async fn search(
        &self,
        query: &str,
        api_key: &str,
        max_results: u32,
    ) -> Result<Vec<SearchResult>, SearchError> {
        tracing::debug!(max_results, "Searching Tavily");

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .json(&TavilySearchRequest {
                api_key,
                query,
                search_depth: "basic",
                max_results,
            })
            .send()
            .await
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error body".to_string());
            return Err(SearchError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let tavily_response: TavilySearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::ResponseParsingFailed(e.to_string()))?;

        let results: Vec<SearchResult> = tavily_response
            .results
            .into_iter()
            .map(|r| SearchResult {
                title: r.title,
                url: r.url,
                content: r.content,
            })
            .collect();
        tracing::debug!("Found {} results", results.len());
        Ok(results)
    }
}
