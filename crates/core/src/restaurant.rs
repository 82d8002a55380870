//! Restaurant profile as needed by the tagging engine

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

/// Identity and locale of a restaurant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestaurantProfile {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Fixed offset from UTC used for weekday and meal-slot bucketing
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl RestaurantProfile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            utc_offset_minutes: 0,
        }
    }

    pub fn with_utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }

    /// Local offset, falling back to UTC when the stored value is out of range
    pub fn offset(&self) -> FixedOffset {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }
}
