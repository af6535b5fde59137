use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use services::usage::{UsageRecord, UsageRepository};
use services::UserId;
use tokio::sync::Mutex;

/// Append-only usage log kept in memory
#[derive(Default)]
pub struct InMemoryUsageRepository {
    records: Mutex<Vec<UsageRecord>>,
}

impl InMemoryUsageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsageRepository for InMemoryUsageRepository {
    async fn record(&self, record: UsageRecord) -> Result<()> {
        self.records.lock().await.push(record);
        Ok(())
    }

    async fn list_records(
        &self,
        user_id: &UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<UsageRecord>> {
        let mut records: Vec<UsageRecord> = self
            .records
            .lock()
            .await
            .iter()
            .filter(|r| &r.user_id == user_id && r.created_at >= from && r.created_at < to)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.created_at);
        Ok(records)
    }
}
