//! Recompute worker for guest insights
//!
//! Drives the tagging engine over every restaurant the record source knows,
//! writes results back and hands triggers to the dispatcher.

pub mod job;
pub mod telemetry;

pub use job::{BatchReport, RecomputeJob, RestaurantFailure, RestaurantReport, Stores};
pub use telemetry::{init_metrics, init_tracing};
