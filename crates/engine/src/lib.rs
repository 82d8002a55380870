//! Customer metrics and tagging engine
//!
//! Turns a restaurant's raw orders, reviews and contacts into per-customer
//! metrics, spend/activity/behaviour tags, a restaurant summary and the
//! automation triggers implied by tag transitions.
//!
//! The engine is synchronous and keeps no state between runs. Prior tags are
//! passed in as a [`PriorTagMap`](guest_insights_core::PriorTagMap) and the
//! next run's prior state is returned by [`TaggingOutcome::tag_snapshot`].

pub mod aggregate;
pub mod baselines;
pub mod classify;
pub mod pipeline;
pub mod rollup;
pub mod triggers;

pub use aggregate::{aggregate, sort_orders};
pub use baselines::{RestaurantBaselines, SpendBands};
pub use classify::{ClassifyContext, TagClassifier};
pub use pipeline::{
    validate_records, CustomerUpdate, RestaurantSnapshot, TaggingEngine, TaggingOutcome,
};
pub use rollup::{summarize, top_customers};
pub use triggers::TriggerDetector;

/// Batch-fatal error raised around the engine by its callers
pub use guest_insights_core::Error as EngineError;
