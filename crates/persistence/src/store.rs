//! Storage seams consumed by the recompute worker

use async_trait::async_trait;
use uuid::Uuid;

use guest_insights_core::{
    AutomationTrigger, Customer, CustomerContact, OrderRecord, PriorTagMap,
    RestaurantCustomerSummary, RestaurantProfile, ReviewRecord,
};

use crate::{PersistenceError, TimeRange};

/// Read side: raw orders, reviews and contacts
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn restaurants(&self) -> Result<Vec<RestaurantProfile>, PersistenceError>;

    async fn restaurant(&self, restaurant_id: &str) -> Result<RestaurantProfile, PersistenceError>;

    async fn orders(
        &self,
        restaurant_id: &str,
        range: TimeRange,
    ) -> Result<Vec<OrderRecord>, PersistenceError>;

    async fn customer_orders(
        &self,
        restaurant_id: &str,
        customer_id: &str,
        range: TimeRange,
    ) -> Result<Vec<OrderRecord>, PersistenceError>;

    async fn reviews(
        &self,
        restaurant_id: &str,
        range: TimeRange,
    ) -> Result<Vec<ReviewRecord>, PersistenceError>;

    async fn contacts(&self, restaurant_id: &str) -> Result<Vec<CustomerContact>, PersistenceError>;
}

/// Tag state left by the previous recomputation
#[async_trait]
pub trait TagStateStore: Send + Sync {
    async fn prior_tags(&self, restaurant_id: &str) -> Result<PriorTagMap, PersistenceError>;
}

/// Write side for recomputed customers and summaries
#[async_trait]
pub trait CustomerSink: Send + Sync {
    /// Upsert customers by id
    async fn write_customers(
        &self,
        restaurant_id: &str,
        customers: &[Customer],
    ) -> Result<(), PersistenceError>;

    async fn write_summary(&self, summary: &RestaurantCustomerSummary) -> Result<(), PersistenceError>;
}

/// Hand-off to the messaging system
#[async_trait]
pub trait TriggerDispatcher: Send + Sync {
    /// Returns the number of triggers accepted
    async fn dispatch(&self, triggers: &[AutomationTrigger]) -> Result<usize, PersistenceError>;

    async fn mark_processed(
        &self,
        trigger_id: Uuid,
        campaign_sent: Option<String>,
    ) -> Result<(), PersistenceError>;
}
