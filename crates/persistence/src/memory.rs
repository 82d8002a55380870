//! In-memory store
//!
//! Implements every storage seam over `parking_lot` locked maps. Seeded from
//! a JSON file of plain records for local runs and tests.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use uuid::Uuid;

use guest_insights_core::{
    AutomationTrigger, Customer, CustomerContact, OrderRecord, PriorTagMap,
    RestaurantCustomerSummary, RestaurantProfile, ReviewRecord,
};

use crate::store::{CustomerSink, RecordSource, TagStateStore, TriggerDispatcher};
use crate::{PersistenceError, TimeRange};

/// Seed file layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSeed {
    #[serde(default)]
    pub restaurants: Vec<RestaurantSeed>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestaurantSeed {
    pub restaurant: RestaurantProfile,
    #[serde(default)]
    pub orders: Vec<OrderRecord>,
    #[serde(default)]
    pub reviews: Vec<ReviewRecord>,
    #[serde(default)]
    pub contacts: Vec<CustomerContact>,
    /// Tag state from an earlier system, used until customers are written
    #[serde(default)]
    pub prior_tags: PriorTagMap,
}

impl RestaurantSeed {
    pub fn new(restaurant: RestaurantProfile) -> Self {
        Self {
            restaurant,
            orders: Vec::new(),
            reviews: Vec::new(),
            contacts: Vec::new(),
            prior_tags: PriorTagMap::new(),
        }
    }
}

#[derive(Debug)]
struct RestaurantData {
    profile: RestaurantProfile,
    orders: Vec<OrderRecord>,
    reviews: Vec<ReviewRecord>,
    contacts: Vec<CustomerContact>,
    prior_tags: PriorTagMap,
    customers: HashMap<String, Customer>,
    summary: Option<RestaurantCustomerSummary>,
}

impl From<RestaurantSeed> for RestaurantData {
    fn from(seed: RestaurantSeed) -> Self {
        Self {
            profile: seed.restaurant,
            orders: seed.orders,
            reviews: seed.reviews,
            contacts: seed.contacts,
            prior_tags: seed.prior_tags,
            customers: HashMap::new(),
            summary: None,
        }
    }
}

/// In-memory implementation of all storage traits
#[derive(Default)]
pub struct InMemoryStore {
    restaurants: RwLock<HashMap<String, RestaurantData>>,
    triggers: RwLock<Vec<AutomationTrigger>>,
    /// Remaining reads to fail with `Unavailable`
    failing_reads: AtomicU32,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: StoreSeed) -> Self {
        let store = Self::new();
        for restaurant in seed.restaurants {
            store.insert_restaurant(restaurant);
        }
        store
    }

    /// Load a seed from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let seed: StoreSeed = serde_json::from_str(&content)?;
        tracing::info!(
            path = %path.as_ref().display(),
            restaurants = seed.restaurants.len(),
            "Loaded store seed"
        );
        Ok(Self::from_seed(seed))
    }

    /// Add or replace a restaurant's records
    pub fn insert_restaurant(&self, seed: RestaurantSeed) {
        self.restaurants
            .write()
            .insert(seed.restaurant.id.clone(), seed.into());
    }

    /// Append raw orders to an existing restaurant
    pub fn append_orders(&self, restaurant_id: &str, orders: Vec<OrderRecord>) -> Result<(), PersistenceError> {
        let mut restaurants = self.restaurants.write();
        let data = restaurants
            .get_mut(restaurant_id)
            .ok_or_else(|| not_found(restaurant_id))?;
        data.orders.extend(orders);
        Ok(())
    }

    /// Make the next `count` reads fail as if the backend were down
    pub fn fail_next_reads(&self, count: u32) {
        self.failing_reads.store(count, Ordering::SeqCst);
    }

    /// Customers last written for a restaurant, ordered by id
    pub fn customers(&self, restaurant_id: &str) -> Vec<Customer> {
        let restaurants = self.restaurants.read();
        let mut customers: Vec<Customer> = restaurants
            .get(restaurant_id)
            .map(|data| data.customers.values().cloned().collect())
            .unwrap_or_default();
        customers.sort_by(|a, b| a.id.cmp(&b.id));
        customers
    }

    pub fn summary(&self, restaurant_id: &str) -> Option<RestaurantCustomerSummary> {
        self.restaurants
            .read()
            .get(restaurant_id)
            .and_then(|data| data.summary.clone())
    }

    /// Every dispatched trigger, in dispatch order
    pub fn triggers(&self) -> Vec<AutomationTrigger> {
        self.triggers.read().clone()
    }

    fn check_available(&self) -> Result<(), PersistenceError> {
        let remaining = self
            .failing_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match remaining {
            Ok(_) => Err(PersistenceError::Unavailable(
                "injected read failure".to_string(),
            )),
            Err(_) => Ok(()),
        }
    }

    fn with_restaurant<T>(
        &self,
        restaurant_id: &str,
        f: impl FnOnce(&RestaurantData) -> T,
    ) -> Result<T, PersistenceError> {
        self.check_available()?;
        let restaurants = self.restaurants.read();
        restaurants
            .get(restaurant_id)
            .map(f)
            .ok_or_else(|| not_found(restaurant_id))
    }
}

fn not_found(restaurant_id: &str) -> PersistenceError {
    PersistenceError::NotFound(format!("restaurant {}", restaurant_id))
}

#[async_trait]
impl RecordSource for InMemoryStore {
    async fn restaurants(&self) -> Result<Vec<RestaurantProfile>, PersistenceError> {
        self.check_available()?;
        let mut profiles: Vec<RestaurantProfile> = self
            .restaurants
            .read()
            .values()
            .map(|data| data.profile.clone())
            .collect();
        profiles.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(profiles)
    }

    async fn restaurant(&self, restaurant_id: &str) -> Result<RestaurantProfile, PersistenceError> {
        self.with_restaurant(restaurant_id, |data| data.profile.clone())
    }

    async fn orders(
        &self,
        restaurant_id: &str,
        range: TimeRange,
    ) -> Result<Vec<OrderRecord>, PersistenceError> {
        self.with_restaurant(restaurant_id, |data| {
            data.orders
                .iter()
                .filter(|o| range.admits(o.timestamp))
                .cloned()
                .collect()
        })
    }

    async fn customer_orders(
        &self,
        restaurant_id: &str,
        customer_id: &str,
        range: TimeRange,
    ) -> Result<Vec<OrderRecord>, PersistenceError> {
        self.with_restaurant(restaurant_id, |data| {
            data.orders
                .iter()
                .filter(|o| o.customer_id.as_deref() == Some(customer_id))
                .filter(|o| range.admits(o.timestamp))
                .cloned()
                .collect()
        })
    }

    async fn reviews(
        &self,
        restaurant_id: &str,
        range: TimeRange,
    ) -> Result<Vec<ReviewRecord>, PersistenceError> {
        self.with_restaurant(restaurant_id, |data| {
            data.reviews
                .iter()
                .filter(|r| range.admits(r.created_at))
                .cloned()
                .collect()
        })
    }

    async fn contacts(&self, restaurant_id: &str) -> Result<Vec<CustomerContact>, PersistenceError> {
        self.with_restaurant(restaurant_id, |data| data.contacts.clone())
    }
}

#[async_trait]
impl TagStateStore for InMemoryStore {
    async fn prior_tags(&self, restaurant_id: &str) -> Result<PriorTagMap, PersistenceError> {
        self.with_restaurant(restaurant_id, |data| {
            if data.customers.is_empty() {
                data.prior_tags.clone()
            } else {
                data.customers
                    .values()
                    .map(|c| (c.id.clone(), c.tag_snapshot()))
                    .collect()
            }
        })
    }
}

#[async_trait]
impl CustomerSink for InMemoryStore {
    async fn write_customers(
        &self,
        restaurant_id: &str,
        customers: &[Customer],
    ) -> Result<(), PersistenceError> {
        let mut restaurants = self.restaurants.write();
        let data = restaurants
            .get_mut(restaurant_id)
            .ok_or_else(|| not_found(restaurant_id))?;
        for customer in customers {
            data.customers.insert(customer.id.clone(), customer.clone());
        }
        Ok(())
    }

    async fn write_summary(&self, summary: &RestaurantCustomerSummary) -> Result<(), PersistenceError> {
        let mut restaurants = self.restaurants.write();
        let data = restaurants
            .get_mut(&summary.restaurant_id)
            .ok_or_else(|| not_found(&summary.restaurant_id))?;
        data.summary = Some(summary.clone());
        Ok(())
    }
}

#[async_trait]
impl TriggerDispatcher for InMemoryStore {
    async fn dispatch(&self, triggers: &[AutomationTrigger]) -> Result<usize, PersistenceError> {
        self.triggers.write().extend_from_slice(triggers);
        Ok(triggers.len())
    }

    async fn mark_processed(
        &self,
        trigger_id: Uuid,
        campaign_sent: Option<String>,
    ) -> Result<(), PersistenceError> {
        let mut triggers = self.triggers.write();
        let trigger = triggers
            .iter_mut()
            .find(|t| t.id == trigger_id)
            .ok_or_else(|| PersistenceError::NotFound(format!("trigger {}", trigger_id)))?;
        trigger.mark_processed(campaign_sent);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use guest_insights_core::{Channel, TagSet, TagSnapshot, TriggerType};

    fn order(id: &str, customer: &str, day: u32) -> OrderRecord {
        OrderRecord {
            id: id.to_string(),
            customer_id: Some(customer.to_string()),
            timestamp: Some(Utc.with_ymd_and_hms(2026, 1, day, 12, 0, 0).unwrap()),
            items: Vec::new(),
            total_amount: Some(10.0),
            guest_count: Some(2),
            channel: Channel::DineIn,
        }
    }

    fn seeded() -> InMemoryStore {
        let mut seed = RestaurantSeed::new(RestaurantProfile::new("r-1"));
        seed.orders = vec![order("o1", "a", 1), order("o2", "b", 10), order("o3", "a", 20)];
        seed.contacts = vec![CustomerContact::new("a").name("Asha")];
        InMemoryStore::from_seed(StoreSeed {
            restaurants: vec![seed, RestaurantSeed::new(RestaurantProfile::new("r-0"))],
        })
    }

    #[tokio::test]
    async fn test_restaurants_sorted() {
        let store = seeded();
        let ids: Vec<String> = store.restaurants().await.unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["r-0", "r-1"]);
    }

    #[tokio::test]
    async fn test_order_queries_respect_range() {
        let store = seeded();
        let from = Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap();
        let range = TimeRange::between(from, from + Duration::days(30));

        assert_eq!(store.orders("r-1", TimeRange::all()).await.unwrap().len(), 3);
        assert_eq!(store.orders("r-1", range).await.unwrap().len(), 2);

        let a = store.customer_orders("r-1", "a", range).await.unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].id, "o3");
    }

    #[tokio::test]
    async fn test_unknown_restaurant() {
        let store = seeded();
        assert!(matches!(
            store.orders("r-9", TimeRange::all()).await,
            Err(PersistenceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_injected_failures_are_consumed() {
        let store = seeded();
        store.fail_next_reads(2);
        assert!(store.contacts("r-1").await.is_err());
        assert!(store.contacts("r-1").await.is_err());
        assert_eq!(store.contacts("r-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_prior_tags_follow_written_customers() {
        let mut seed = RestaurantSeed::new(RestaurantProfile::new("r-1"));
        seed.prior_tags.insert(
            "legacy".to_string(),
            TagSnapshot {
                tags: TagSet::default(),
                total_visits: 3,
            },
        );
        let store = InMemoryStore::from_seed(StoreSeed {
            restaurants: vec![seed],
        });
        assert!(store.prior_tags("r-1").await.unwrap().contains_key("legacy"));

        let mut customer = Customer::from_contact(CustomerContact::new("fresh"));
        customer.metrics.total_visits = 1;
        store.write_customers("r-1", &[customer]).await.unwrap();

        let prior = store.prior_tags("r-1").await.unwrap();
        assert_eq!(prior.len(), 1);
        assert_eq!(prior["fresh"].total_visits, 1);
        assert_eq!(store.customers("r-1").len(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_and_mark_processed() {
        let store = seeded();
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let trigger = AutomationTrigger::new("r-1", "a", TriggerType::NewCustomer, None, TagSet::default(), now);
        let id = trigger.id;

        assert_eq!(store.dispatch(&[trigger]).await.unwrap(), 1);
        store.mark_processed(id, Some("welcome".to_string())).await.unwrap();

        let stored = store.triggers();
        assert!(stored[0].processed);
        assert_eq!(stored[0].campaign_sent.as_deref(), Some("welcome"));

        assert!(matches!(
            store.mark_processed(Uuid::new_v4(), None).await,
            Err(PersistenceError::NotFound(_))
        ));
    }
}
