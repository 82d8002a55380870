//! Error types shared across the workspace
//!
//! Two families live here:
//! - [`RecordIssue`]: a single bad input record. Always recovered locally by
//!   skipping the record and reporting it.
//! - [`Error`]: a structural failure that aborts a whole restaurant batch.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why an input record was excluded from aggregation
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordIssue {
    #[error("record {record_id} has no customer id")]
    MissingCustomer { record_id: String },

    #[error("record {record_id} has no timestamp")]
    MissingTimestamp { record_id: String },

    #[error("order {record_id} has no total amount")]
    MissingAmount { record_id: String },

    #[error("order {record_id} has invalid total amount {amount}")]
    InvalidAmount { record_id: String, amount: f64 },

    #[error("review {record_id} has no rating")]
    MissingRating { record_id: String },

    #[error("review {record_id} has rating {rating} outside 1..=5")]
    InvalidRating { record_id: String, rating: i32 },
}

impl RecordIssue {
    /// Id of the offending record
    pub fn record_id(&self) -> &str {
        match self {
            Self::MissingCustomer { record_id }
            | Self::MissingTimestamp { record_id }
            | Self::MissingAmount { record_id }
            | Self::MissingRating { record_id }
            | Self::InvalidAmount { record_id, .. }
            | Self::InvalidRating { record_id, .. } => record_id,
        }
    }
}

/// Records dropped during validation, surfaced to the caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkippedRecords {
    pub orders: Vec<RecordIssue>,
    pub reviews: Vec<RecordIssue>,
}

impl SkippedRecords {
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    pub fn review_count(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty() && self.reviews.is_empty()
    }
}

/// Batch-fatal errors. The caller retries the whole restaurant computation.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Record source error: {0}")]
    Source(String),

    #[error("Customer sink error: {0}")]
    Sink(String),

    #[error("Trigger dispatch error: {0}")]
    Dispatch(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Computation failed: {0}")]
    Computation(String),

    #[error("No frozen baselines for restaurant {0}")]
    MissingBaselines(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Storage-side failures may clear up on a later attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Source(_) | Self::Sink(_) | Self::Dispatch(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_issue_exposes_id() {
        let issue = RecordIssue::InvalidAmount {
            record_id: "ord-7".to_string(),
            amount: -3.0,
        };
        assert_eq!(issue.record_id(), "ord-7");
        assert!(issue.to_string().contains("ord-7"));
    }

    #[test]
    fn test_skipped_records_counts() {
        let mut skipped = SkippedRecords::default();
        assert!(skipped.is_empty());

        skipped.orders.push(RecordIssue::MissingTimestamp {
            record_id: "ord-1".to_string(),
        });
        assert_eq!(skipped.order_count(), 1);
        assert_eq!(skipped.review_count(), 0);
        assert!(!skipped.is_empty());
    }

    #[test]
    fn test_retryable_errors() {
        assert!(Error::Source("timeout".to_string()).is_retryable());
        assert!(Error::Dispatch("queue full".to_string()).is_retryable());
        assert!(!Error::Config("bad threshold".to_string()).is_retryable());
        assert!(!Error::NotFound("restaurant r-9".to_string()).is_retryable());
        assert!(!Error::Computation("worker panicked".to_string()).is_retryable());
    }
}
