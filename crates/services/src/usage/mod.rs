//! Per-user activity history.
//!
//! Every chat turn and every metered web search is logged. The log backs the
//! daily history and the per-model statistics of a month. Logging never
//! fails a chat turn.

pub mod models;
pub mod ports;

pub use models::{DailyUsage, ModelUsage, UsageKind, UsagePeriod, UsageRecord};
pub use ports::{UsageError, UsageRepository};

use crate::UserId;
use chrono::Utc;
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

/// Bucket for turns whose model is unknown
pub const UNKNOWN_MODEL: &str = "unknown";

pub struct UsageService {
    usage_repository: Arc<dyn UsageRepository>,
}

impl UsageService {
    pub fn new(usage_repository: Arc<dyn UsageRepository>) -> Self {
        Self { usage_repository }
    }

    /// Log one action; failures are logged and swallowed
    pub async fn record(&self, user_id: &UserId, kind: UsageKind, model: Option<&str>) {
        let record = UsageRecord {
            user_id: user_id.clone(),
            kind,
            model: model.map(str::to_string),
            created_at: Utc::now(),
        };
        if let Err(e) = self.usage_repository.record(record).await {
            tracing::warn!(user_id = %user_id, kind = ?kind, error = %e, "Failed to record usage");
        }
    }

    async fn records(
        &self,
        user_id: &UserId,
        period: UsagePeriod,
    ) -> Result<Vec<UsageRecord>, UsageError> {
        let (from, to) = period.bounds()?;
        self.usage_repository
            .list_records(user_id, from, to)
            .await
            .map_err(|e| UsageError::InternalError(format!("Failed to load usage: {e}")))
    }

    /// Days of the month with any activity, oldest first
    pub async fn history(
        &self,
        user_id: &UserId,
        period: UsagePeriod,
    ) -> Result<Vec<DailyUsage>, UsageError> {
        let mut days = BTreeMap::new();
        for record in self.records(user_id, period).await? {
            let day = days
                .entry(record.created_at.date_naive())
                .or_insert((0, 0));
            match record.kind {
                UsageKind::Message => day.0 += 1,
                UsageKind::Search => day.1 += 1,
            }
        }

        Ok(days
            .into_iter()
            .map(|(date, (messages, searches))| DailyUsage {
                date,
                messages,
                searches,
            })
            .collect())
    }

    /// Turns per model in the month, busiest model first
    pub async fn model_stats(
        &self,
        user_id: &UserId,
        period: UsagePeriod,
    ) -> Result<Vec<ModelUsage>, UsageError> {
        let mut counts: HashMap<String, i64> = HashMap::new();
        for record in self.records(user_id, period).await? {
            if record.kind != UsageKind::Message {
                continue;
            }
            let model = record.model.unwrap_or_else(|| UNKNOWN_MODEL.to_string());
            *counts.entry(model).or_default() += 1;
        }

        let mut stats: Vec<ModelUsage> = counts
            .into_iter()
            .map(|(model, messages)| ModelUsage { model, messages })
            .collect();
        stats.sort_by(|a, b| b.messages.cmp(&a.messages).then_with(|| a.model.cmp(&b.model)));
        Ok(stats)
    }
}
