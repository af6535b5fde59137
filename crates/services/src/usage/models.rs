use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{usage::ports::UsageError, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageKind {
    /// One chat turn sent by the user
    Message,
    /// One metered web search
    Search,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub user_id: UserId,
    pub kind: UsageKind,
    /// Model that answered the turn
    pub model: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Activity of one calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyUsage {
    pub date: NaiveDate,
    pub messages: i64,
    pub searches: i64,
}

/// Turns answered by one model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelUsage {
    pub model: String,
    pub messages: i64,
}

/// A calendar month in UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UsagePeriod {
    pub year: i32,
    pub month: u32,
}

impl UsagePeriod {
    pub fn new(year: i32, month: u32) -> Result<Self, UsageError> {
        if !(1..=12).contains(&month) {
            return Err(UsageError::InvalidParams(format!(
                "Month must be between 1 and 12, got {month}"
            )));
        }
        if !(2000..=9999).contains(&year) {
            return Err(UsageError::InvalidParams(format!("Invalid year: {year}")));
        }
        Ok(Self { year, month })
    }

    /// Half-open range `[first day, first day of next month)`
    pub fn bounds(&self) -> Result<(DateTime<Utc>, DateTime<Utc>), UsageError> {
        let (next_year, next_month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        let start = Utc.with_ymd_and_hms(self.year, self.month, 1, 0, 0, 0).single();
        let end = Utc.with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0).single();

        start.zip(end).ok_or_else(|| {
            UsageError::InvalidParams(format!("Invalid period {}-{:02}", self.year, self.month))
        })
    }
}
