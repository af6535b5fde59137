use crate::UserId;
use async_trait::async_trait;
use inference_providers::SearchResult;

#[cfg(any(test, feature = "test-mocks"))]
use mockall::automock;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Search request failed: {0}")]
    RequestFailed(String),
    #[error("Search service returned an error: {status} {body}")]
    ApiError { status: u16, body: String },
    #[error("Search response parsing failed: {0}")]
    ResponseParsingFailed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum QuotaError {
    #[error(
        "Monthly search limit of {limit} reached. The limit resets on the 1st of next month."
    )]
    Exceeded { limit: i64 },
    #[error("Quota storage error: {0}")]
    Repository(String),
}

/// Web search provider trait
#[cfg_attr(any(test, feature = "test-mocks"), automock)]
#[async_trait]
pub trait WebSearchProviderTrait: Send + Sync {
    async fn search(
        &self,
        query: &str,
        api_key: &str,
        max_results: u32,
    ) -> Result<Vec<SearchResult>, SearchError>;
}

/// Answer engine: one call produces a synthesized answer plus citations.
///
/// The first returned record carries the answer text in `content`; the
/// remaining records are the cited sources.
#[cfg_attr(any(test, feature = "test-mocks"), automock)]
#[async_trait]
pub trait AnswerEngineTrait: Send + Sync {
    async fn answer(&self, query: &str, api_key: &str) -> Result<Vec<SearchResult>, SearchError>;
}

/// Monthly web-search counter, keyed by user and period (`YYYY-MM`)
#[cfg_attr(any(test, feature = "test-mocks"), automock)]
#[async_trait]
pub trait SearchQuotaRepository: Send + Sync {
    /// Count one search if the user is below `limit`.
    ///
    /// Returns the remaining allowance after counting, or `None` when the limit
    /// had already been reached (nothing is counted in that case).
    async fn increment_and_check(
        &self,
        user_id: &UserId,
        period: &str,
        limit: i64,
    ) -> anyhow::Result<Option<i64>>;

    /// Searches already used in the period
    async fn used(&self, user_id: &UserId, period: &str) -> anyhow::Result<i64>;
}
