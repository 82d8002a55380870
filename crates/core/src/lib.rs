//! Core types for guest insights
//!
//! This crate provides the records and entities every other crate shares:
//! - Raw and validated orders and reviews
//! - Customers with aggregate metrics and tags
//! - Restaurant profiles, summaries and automation triggers
//! - Error types

pub mod customer;
pub mod error;
pub mod order;
pub mod restaurant;
pub mod review;
pub mod summary;
pub mod tags;
pub mod trigger;

pub use customer::{Customer, CustomerContact, CustomerMetrics, SECONDS_PER_DAY};
pub use error::{Error, RecordIssue, Result, SkippedRecords};
pub use order::{Channel, LineItem, Order, OrderRecord, UNCATEGORIZED};
pub use restaurant::RestaurantProfile;
pub use review::{Review, ReviewRecord};
pub use summary::{RestaurantCustomerSummary, TopCustomer};
pub use tags::{ActivityTag, BehaviorTag, PriorTagMap, SpendTag, TagSet, TagSnapshot};
pub use trigger::{AutomationTrigger, TriggerType};
