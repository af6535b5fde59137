//! Perplexity answer engine
//!
//! A single non-streaming chat completion against a search-grounded model.
//! The answer becomes the first record; citations follow.

pub use super::ports::*;
use inference_providers::SearchResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const PERPLEXITY_BASE_URL: &str = "https://api.perplexity.ai";
pub const PERPLEXITY_DEFAULT_MODEL: &str = "sonar";

/// Title of the record carrying the synthesized answer
pub const ANSWER_TITLE: &str = "Perplexity";

pub struct PerplexityAnswerEngine {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl PerplexityAnswerEngine {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, timeout_seconds: i64) -> Self {
        let base_url = base_url.into();
        let base_url = if base_url.trim().is_empty() {
            PERPLEXITY_BASE_URL.to_string()
        } else {
            base_url.trim_end_matches('/').to_string()
        };
        let model = model.into();
        let model = if model.trim().is_empty() {
            PERPLEXITY_DEFAULT_MODEL.to_string()
        } else {
            model
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds.max(1) as u64))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });

        Self {
            base_url,
            model,
            client,
        }
    }
}

#[derive(Debug, Serialize)]
struct PerplexityRequest<'a> {
    model: &'a str,
    messages: [PerplexityMessage<'a>; 1],
    stream: bool,
}

#[derive(Debug, Serialize)]
struct PerplexityMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct PerplexityResponse {
    #[serde(default)]
    choices: Vec<PerplexityChoice>,
    /// Plain citation URLs (older API shape)
    #[serde(default)]
    citations: Vec<String>,
    /// Structured citations (newer API shape)
    #[serde(default)]
    search_results: Vec<PerplexitySearchResult>,
}

#[derive(Debug, Deserialize)]
struct PerplexityChoice {
    message: PerplexityAnswer,
}

#[derive(Debug, Deserialize)]
struct PerplexityAnswer {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct PerplexitySearchResult {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    snippet: String,
}

fn into_records(response: PerplexityResponse) -> Vec<SearchResult> {
    let answer = response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .unwrap_or_default();
    if answer.trim().is_empty() {
        return Vec::new();
    }

    let mut records = vec![SearchResult {
        title: ANSWER_TITLE.to_string(),
        url: String::new(),
        content: answer,
    }];

    if !response.search_results.is_empty() {
        records.extend(response.search_results.into_iter().map(|r| SearchResult {
            title: if r.title.is_empty() { r.url.clone() } else { r.title },
            url: r.url,
            content: r.snippet,
        }));
    } else {
        records.extend(response.citations.into_iter().map(|url| SearchResult {
            title: url.clone(),
            url,
            content: String::new(),
        }));
    }

    records
}

#[async_trait::async_trait]
impl AnswerEngineTrait for PerplexityAnswerEngine {
    async fn answer(&self, query: &str, api_key: &str) -> Result<Vec<SearchResult>, SearchError> {
        tracing::debug!(model = %self.model, "Querying answer engine");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&PerplexityRequest {
                model: &self.model,
                messages: [PerplexityMessage {
                    role: "user",
                    content: query,
                }],
                stream: false,
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

        let parsed: PerplexityResponse = response
            .json()
            .await
            .map_err(|e| SearchError::ResponseParsingFailed(e.to_string()))?;

        Ok(into_records(parsed))
    }
}
