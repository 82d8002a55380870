//! Time window for record queries

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Half-open window: `from` inclusive, `to` exclusive, either side optional
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
}

impl TimeRange {
    /// Unbounded window
    pub fn all() -> Self {
        Self::default()
    }

    pub fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    /// The `days` before `now`, ending at `now`
    pub fn lookback(now: DateTime<Utc>, days: u32) -> Self {
        Self::between(now - Duration::days(days as i64), now)
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.from.map_or(true, |from| ts >= from) && self.to.map_or(true, |to| ts < to)
    }

    /// Records without a timestamp pass through so validation can report them
    pub fn admits(&self, ts: Option<DateTime<Utc>>) -> bool {
        ts.map_or(true, |ts| self.contains(ts))
    }
}
