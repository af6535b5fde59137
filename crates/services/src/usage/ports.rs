use crate::{usage::models::UsageRecord, UserId};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[cfg(any(test, feature = "test-mocks"))]
use mockall::automock;

#[derive(Debug, thiserror::Error)]
pub enum UsageError {
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Append-only log of metered actions
#[cfg_attr(any(test, feature = "test-mocks"), automock)]
#[async_trait]
pub trait UsageRepository: Send + Sync {
    async fn record(&self, record: UsageRecord) -> Result<()>;

    /// Records of a user with `from <= created_at < to`, oldest first
    async fn list_records(
        &self,
        user_id: &UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<UsageRecord>>;
}
