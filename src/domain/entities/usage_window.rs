use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

/// Returns true when `reset_at` lies in a different calendar month (or year)
/// than `now`, i.e. the AI usage counter is due for its lazy monthly reset.
pub fn needs_reset(reset_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    reset_at.month() != now.month() || reset_at.year() != now.year()
}

/// Counter value that applies to `now`, taking a pending reset into account.
pub fn effective_count(count: i32, reset_at: DateTime<Utc>, now: DateTime<Utc>) -> i32 {
    if needs_reset(reset_at, now) { 0 } else { count }
}

/// Per-account, per-window quota state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageState {
    Counting,
    Exhausted,
}

impl UsageState {
    pub fn of(count: i32, limit: Option<i32>) -> Self {
        match limit {
            Some(limit) if count >= limit => UsageState::Exhausted,
            _ => UsageState::Counting,
        }
    }
}
