//! Persistence seams for guest insights
//!
//! Provides the storage traits the recompute worker runs against:
//! - `RecordSource` for raw orders, reviews, contacts and restaurants
//! - `TagStateStore` for the previous run's tags
//! - `CustomerSink` for recomputed customers and summaries
//! - `TriggerDispatcher` for automation triggers
//!
//! `InMemoryStore` implements all of them and can be seeded from JSON.

pub mod error;
pub mod memory;
pub mod range;
pub mod store;

pub use error::PersistenceError;
pub use memory::{InMemoryStore, RestaurantSeed, StoreSeed};
pub use range::TimeRange;
pub use store::{CustomerSink, RecordSource, TagStateStore, TriggerDispatcher};
