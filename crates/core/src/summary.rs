//! Restaurant-wide customer rollup

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::tags::{ActivityTag, BehaviorTag, SpendTag};

/// Entry of the top-by-LTV list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopCustomer {
    pub customer_id: String,
    pub total_spend: f64,
    pub total_visits: u32,
}

/// Derived view over all customers of one restaurant
///
/// Rates are fractions in `[0, 1]`. Recomputed wholesale after every batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantCustomerSummary {
    pub restaurant_id: String,
    pub generated_at: DateTime<Utc>,
    pub total_customers: usize,
    pub churn_rate: f64,
    pub active_rate: f64,
    pub restaurant_avg_visit_gap: Option<f64>,
    pub top_customers: Vec<TopCustomer>,
    pub behavior_histogram: BTreeMap<BehaviorTag, usize>,
    pub spend_distribution: BTreeMap<SpendTag, usize>,
    pub activity_distribution: BTreeMap<ActivityTag, usize>,
    pub total_revenue: f64,
    pub average_ltv: f64,
    pub median_order_value: f64,
    /// Line revenue per menu category
    pub category_revenue: BTreeMap<String, f64>,
    pub skipped_orders: usize,
    pub skipped_reviews: usize,
}

impl RestaurantCustomerSummary {
    /// Summary of a restaurant with no customers
    pub fn empty(restaurant_id: impl Into<String>, generated_at: DateTime<Utc>) -> Self {
        Self {
            restaurant_id: restaurant_id.into(),
            generated_at,
            total_customers: 0,
            churn_rate: 0.0,
            active_rate: 0.0,
            restaurant_avg_visit_gap: None,
            top_customers: Vec::new(),
            behavior_histogram: BTreeMap::new(),
            spend_distribution: BTreeMap::new(),
            activity_distribution: BTreeMap::new(),
            total_revenue: 0.0,
            average_ltv: 0.0,
            median_order_value: 0.0,
            category_revenue: BTreeMap::new(),
            skipped_orders: 0,
            skipped_reviews: 0,
        }
    }

    pub fn spend_count(&self, tag: SpendTag) -> usize {
        self.spend_distribution.get(&tag).copied().unwrap_or(0)
    }

    pub fn activity_count(&self, tag: ActivityTag) -> usize {
        self.activity_distribution.get(&tag).copied().unwrap_or(0)
    }

    pub fn behavior_count(&self, tag: BehaviorTag) -> usize {
        self.behavior_histogram.get(&tag).copied().unwrap_or(0)
    }
}
