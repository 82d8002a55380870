//! Review records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RecordIssue;

/// Raw review as read from the external store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub id: String,

    #[serde(default)]
    pub customer_id: Option<String>,

    #[serde(default)]
    pub order_id: Option<String>,

    #[serde(default)]
    pub rating: Option<i32>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl ReviewRecord {
    pub fn validate(self) -> Result<Review, RecordIssue> {
        let customer_id = match self.customer_id {
            Some(id) if !id.trim().is_empty() => id,
            _ => return Err(RecordIssue::MissingCustomer { record_id: self.id }),
        };

        let rating = match self.rating {
            None => return Err(RecordIssue::MissingRating { record_id: self.id }),
            Some(rating) if !(1..=5).contains(&rating) => {
                return Err(RecordIssue::InvalidRating {
                    record_id: self.id,
                    rating,
                })
            },
            Some(rating) => rating as u8,
        };

        let Some(created_at) = self.created_at else {
            return Err(RecordIssue::MissingTimestamp { record_id: self.id });
        };

        Ok(Review {
            id: self.id,
            customer_id,
            order_id: self.order_id,
            rating,
            created_at,
        })
    }
}

/// Validated review with a 1..=5 star rating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub customer_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,

    pub rating: u8,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(rating: i32) -> ReviewRecord {
        ReviewRecord {
            id: "rev-1".to_string(),
            customer_id: Some("cust-1".to_string()),
            order_id: None,
            rating: Some(rating),
            created_at: Some(Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()),
        }
    }

    #[test]
    fn test_rating_bounds() {
        assert!(record(1).validate().is_ok());
        assert!(record(5).validate().is_ok());
        assert!(matches!(
            record(0).validate(),
            Err(RecordIssue::InvalidRating { rating: 0, .. })
        ));
        assert!(matches!(
            record(6).validate(),
            Err(RecordIssue::InvalidRating { rating: 6, .. })
        ));
    }

    #[test]
    fn test_missing_rating() {
        let mut r = record(4);
        r.rating = None;
        assert!(matches!(r.validate(), Err(RecordIssue::MissingRating { .. })));

        let json = r#"{"id":"rev-2","customer_id":"c","created_at":"2026-03-02T09:00:00Z"}"#;
        let r: ReviewRecord = serde_json::from_str(json).unwrap();
        assert_eq!(r.rating, None);
    }

    #[test]
    fn test_missing_customer() {
        let mut r = record(4);
        r.customer_id = None;
        assert!(matches!(r.validate(), Err(RecordIssue::MissingCustomer { .. })));
    }
}
