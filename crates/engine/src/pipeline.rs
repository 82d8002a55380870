//! Restaurant recomputation pipeline
//!
//! One run is strictly phased: validate, group by customer, aggregate every
//! customer, compute frozen baselines, classify, summarize, detect triggers.
//! No classification starts before every aggregate is final.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use guest_insights_config::TaggingConfig;
use guest_insights_core::{
    AutomationTrigger, Customer, CustomerContact, Order, OrderRecord, PriorTagMap,
    RestaurantCustomerSummary, RestaurantProfile, Review, ReviewRecord, SkippedRecords,
    TagSnapshot,
};

use crate::aggregate::{aggregate, sort_orders};
use crate::baselines::RestaurantBaselines;
use crate::classify::{ClassifyContext, TagClassifier};
use crate::rollup::summarize;
use crate::triggers::TriggerDetector;

/// All raw records of one restaurant for one recomputation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestaurantSnapshot {
    pub restaurant: RestaurantProfile,
    #[serde(default)]
    pub orders: Vec<OrderRecord>,
    #[serde(default)]
    pub reviews: Vec<ReviewRecord>,
    #[serde(default)]
    pub contacts: Vec<CustomerContact>,
}

impl RestaurantSnapshot {
    pub fn new(restaurant: RestaurantProfile) -> Self {
        Self {
            restaurant,
            orders: Vec::new(),
            reviews: Vec::new(),
            contacts: Vec::new(),
        }
    }

    pub fn with_orders(mut self, orders: Vec<OrderRecord>) -> Self {
        self.orders = orders;
        self
    }

    pub fn with_reviews(mut self, reviews: Vec<ReviewRecord>) -> Self {
        self.reviews = reviews;
        self
    }

    pub fn with_contacts(mut self, contacts: Vec<CustomerContact>) -> Self {
        self.contacts = contacts;
        self
    }
}

/// Result of one restaurant run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggingOutcome {
    pub restaurant_id: String,
    /// Customers ordered by id
    pub customers: Vec<Customer>,
    pub summary: RestaurantCustomerSummary,
    pub triggers: Vec<AutomationTrigger>,
    pub skipped: SkippedRecords,
    pub baselines: RestaurantBaselines,
}

impl TaggingOutcome {
    /// Prior state to feed into the next run
    pub fn tag_snapshot(&self) -> PriorTagMap {
        self.customers
            .iter()
            .map(|c| (c.id.clone(), c.tag_snapshot()))
            .collect()
    }

    pub fn customer(&self, id: &str) -> Option<&Customer> {
        self.customers
            .binary_search_by(|c| c.id.as_str().cmp(id))
            .ok()
            .map(|idx| &self.customers[idx])
    }
}

/// A single customer recomputed against frozen baselines
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerUpdate {
    pub customer: Customer,
    pub trigger: Option<AutomationTrigger>,
}

/// Stateless tagging engine; prior tags come in, new tags go out
#[derive(Debug, Clone)]
pub struct TaggingEngine {
    classifier: TagClassifier,
    detector: TriggerDetector,
}

impl TaggingEngine {
    pub fn new(config: TaggingConfig) -> Self {
        let detector = TriggerDetector::new(config.milestones.clone());
        Self {
            classifier: TagClassifier::new(config),
            detector,
        }
    }

    pub fn config(&self) -> &TaggingConfig {
        self.classifier.config()
    }

    /// Recompute every customer of a restaurant
    pub fn run(
        &self,
        snapshot: RestaurantSnapshot,
        prior: &PriorTagMap,
        now: DateTime<Utc>,
    ) -> TaggingOutcome {
        let RestaurantSnapshot {
            restaurant,
            orders,
            reviews,
            contacts,
        } = snapshot;

        let span = tracing::info_span!("tagging_run", restaurant_id = %restaurant.id);
        let _enter = span.enter();

        let (orders, reviews, skipped) = validate_records(orders, reviews);
        if !skipped.is_empty() {
            tracing::warn!(
                skipped_orders = skipped.order_count(),
                skipped_reviews = skipped.review_count(),
                "Skipped malformed records"
            );
        }

        // Phase 1: every aggregate is final before any baseline is read
        let mut customers = group_customers(contacts, orders, reviews);
        let baselines = RestaurantBaselines::compute(&customers, self.config());

        // Phase 2
        let ctx = ClassifyContext {
            baselines: &baselines,
            offset: restaurant.offset(),
            now,
        };
        for customer in &mut customers {
            customer.tags = self.classifier.classify(customer, &ctx);
        }

        let summary = summarize(
            &restaurant.id,
            &customers,
            &baselines,
            self.config(),
            &skipped,
            now,
        );
        let triggers = self.detector.detect(&restaurant.id, &customers, prior, now);

        tracing::info!(
            customers = customers.len(),
            triggers = triggers.len(),
            churn_rate = summary.churn_rate,
            "Restaurant recomputed"
        );

        TaggingOutcome {
            restaurant_id: restaurant.id,
            customers,
            summary,
            triggers,
            skipped,
            baselines,
        }
    }

    /// Recompute one customer's metrics and tags without touching the
    /// restaurant baselines
    ///
    /// `orders` and `reviews` are the customer's full history. `prior` is the
    /// customer's stored tag state, `None` for a customer never tagged before.
    #[allow(clippy::too_many_arguments)]
    pub fn recompute_customer(
        &self,
        restaurant: &RestaurantProfile,
        customer: Customer,
        prior: Option<&TagSnapshot>,
        mut orders: Vec<Order>,
        reviews: &[Review],
        baselines: &RestaurantBaselines,
        now: DateTime<Utc>,
    ) -> CustomerUpdate {
        sort_orders(&mut orders);
        let mut updated = customer;
        updated.metrics = aggregate(&orders, reviews);
        updated.orders = orders;

        let ctx = ClassifyContext {
            baselines,
            offset: restaurant.offset(),
            now,
        };
        updated.tags = self.classifier.classify(&updated, &ctx);

        let trigger = self
            .detector
            .detect_one(&restaurant.id, &updated, prior, now);

        tracing::debug!(
            restaurant_id = %restaurant.id,
            customer_id = %updated.id,
            visits = updated.metrics.total_visits,
            changed = trigger.is_some(),
            "Customer recomputed"
        );

        CustomerUpdate {
            customer: updated,
            trigger,
        }
    }
}

/// Split raw records into valid ones and skipped issues
pub fn validate_records(
    orders: Vec<OrderRecord>,
    reviews: Vec<ReviewRecord>,
) -> (Vec<Order>, Vec<Review>, SkippedRecords) {
    let mut skipped = SkippedRecords::default();

    let mut valid_orders = Vec::with_capacity(orders.len());
    for record in orders {
        match record.validate() {
            Ok(order) => valid_orders.push(order),
            Err(issue) => {
                tracing::debug!(record_id = %issue.record_id(), error = %issue, "Skipping order");
                skipped.orders.push(issue);
            },
        }
    }

    let mut valid_reviews = Vec::with_capacity(reviews.len());
    for record in reviews {
        match record.validate() {
            Ok(review) => valid_reviews.push(review),
            Err(issue) => {
                tracing::debug!(record_id = %issue.record_id(), error = %issue, "Skipping review");
                skipped.reviews.push(issue);
            },
        }
    }

    (valid_orders, valid_reviews, skipped)
}

/// One customer per id seen in contacts, orders or reviews, ordered by id
fn group_customers(
    contacts: Vec<CustomerContact>,
    orders: Vec<Order>,
    reviews: Vec<Review>,
) -> Vec<Customer> {
    let mut history: BTreeMap<String, (Option<CustomerContact>, Vec<Order>, Vec<Review>)> =
        BTreeMap::new();

    for contact in contacts {
        let entry = history.entry(contact.id.clone()).or_default();
        if entry.0.is_none() {
            entry.0 = Some(contact);
        }
    }
    for order in orders {
        history.entry(order.customer_id.clone()).or_default().1.push(order);
    }
    for review in reviews {
        history.entry(review.customer_id.clone()).or_default().2.push(review);
    }

    history
        .into_iter()
        .map(|(id, (contact, mut orders, reviews))| {
            let mut customer =
                Customer::from_contact(contact.unwrap_or_else(|| CustomerContact::new(id)));
            sort_orders(&mut orders);
            customer.metrics = aggregate(&orders, &reviews);
            customer.orders = orders;
            customer
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use guest_insights_core::{ActivityTag, SpendTag, TriggerType};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn record(id: &str, customer: &str, days_ago: i64, amount: f64) -> OrderRecord {
        OrderRecord {
            id: id.to_string(),
            customer_id: Some(customer.to_string()),
            timestamp: Some(now() - Duration::days(days_ago)),
            items: Vec::new(),
            total_amount: Some(amount),
            guest_count: None,
            channel: Default::default(),
        }
    }

    #[test]
    fn test_customers_sorted_and_contacts_kept() {
        let snapshot = RestaurantSnapshot::new(RestaurantProfile::new("r-1"))
            .with_orders(vec![record("o1", "zed", 3, 10.0), record("o2", "amy", 2, 20.0)])
            .with_contacts(vec![CustomerContact::new("bob").name("Bob")]);

        let outcome = TaggingEngine::new(TaggingConfig::default()).run(snapshot, &PriorTagMap::new(), now());
        let ids: Vec<&str> = outcome.customers.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["amy", "bob", "zed"]);

        let bob = outcome.customer("bob").unwrap();
        assert_eq!(bob.display_name(), "Bob");
        assert_eq!(bob.metrics.total_visits, 0);
        assert_eq!(bob.tags.activity_tag, ActivityTag::New);
        assert_eq!(bob.tags.spend_tag, SpendTag::LowSpender);
        assert!(outcome.customer("nobody").is_none());
    }

    #[test]
    fn test_recompute_customer_against_frozen_baselines() {
        let engine = TaggingEngine::new(TaggingConfig::default());
        let restaurant = RestaurantProfile::new("r-1");
        let snapshot = RestaurantSnapshot::new(restaurant.clone()).with_orders(vec![
            record("o1", "a", 40, 10.0),
            record("o2", "a", 30, 10.0),
            record("o3", "b", 5, 500.0),
        ]);
        let outcome = engine.run(snapshot, &PriorTagMap::new(), now());
        let a = outcome.customer("a").unwrap().clone();
        assert_eq!(a.tags.activity_tag, ActivityTag::ChurnRisk);

        let mut history = a.orders.clone();
        history.push(Order::new("o4", "a", now() - Duration::days(1), 10.0));

        let prior = a.tag_snapshot();
        let update = engine.recompute_customer(
            &restaurant,
            a.clone(),
            Some(&prior),
            history,
            &[],
            &outcome.baselines,
            now(),
        );
        assert_eq!(update.customer.metrics.total_visits, 3);
        assert_eq!(update.customer.tags.activity_tag, ActivityTag::Active);
        let trigger = update.trigger.unwrap();
        assert_eq!(trigger.trigger_type, TriggerType::TagChanged);
        assert_eq!(trigger.old_tags.as_ref(), Some(&a.tags));
    }

    #[test]
    fn test_recompute_unknown_customer_is_new() {
        let engine = TaggingEngine::new(TaggingConfig::default());
        let restaurant = RestaurantProfile::new("r-1");
        let update = engine.recompute_customer(
            &restaurant,
            Customer::from_contact(CustomerContact::new("walk-in")),
            None,
            vec![Order::new("o1", "walk-in", now() - Duration::days(1), 12.0)],
            &[],
            &RestaurantBaselines::default(),
            now(),
        );
        assert_eq!(update.customer.metrics.total_visits, 1);
        assert_eq!(update.trigger.unwrap().trigger_type, TriggerType::NewCustomer);
    }
}
