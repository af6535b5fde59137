use anyhow::Result;
use async_trait::async_trait;
use services::search::SearchQuotaRepository;
use services::UserId;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Monthly search counters keyed by user and period
#[derive(Default)]
pub struct InMemorySearchQuotaRepository {
    counters: Mutex<HashMap<(UserId, String), i64>>,
}

impl InMemorySearchQuotaRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SearchQuotaRepository for InMemorySearchQuotaRepository {
    async fn increment_and_check(
        &self,
        user_id: &UserId,
        period: &str,
        limit: i64,
    ) -> Result<Option<i64>> {
        // Check and increment under one lock
        let mut counters = self.counters.lock().await;
        let used = counters
            .entry((user_id.clone(), period.to_string()))
            .or_insert(0);

        if *used >= limit {
            tracing::info!(user_id = %user_id, period, limit, "Search quota exhausted");
            return Ok(None);
        }

        *used += 1;
        Ok(Some(limit - *used))
    }

    async fn used(&self, user_id: &UserId, period: &str) -> Result<i64> {
        Ok(self
            .counters
            .lock()
            .await
            .get(&(user_id.clone(), period.to_string()))
            .copied()
            .unwrap_or(0))
    }
}
