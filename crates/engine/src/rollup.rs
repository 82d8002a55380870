//! Restaurant summary built from classified customers

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use guest_insights_config::TaggingConfig;
use guest_insights_core::{
    ActivityTag, Customer, RestaurantCustomerSummary, SkippedRecords, SpendTag, TopCustomer,
};

use crate::aggregate::category_spend;
use crate::baselines::RestaurantBaselines;

/// Build the summary from customers that already carry their final tags
pub fn summarize(
    restaurant_id: &str,
    customers: &[Customer],
    baselines: &RestaurantBaselines,
    config: &TaggingConfig,
    skipped: &SkippedRecords,
    now: DateTime<Utc>,
) -> RestaurantCustomerSummary {
    let mut summary = RestaurantCustomerSummary::empty(restaurant_id, now);
    summary.skipped_orders = skipped.order_count();
    summary.skipped_reviews = skipped.review_count();

    if customers.is_empty() {
        tracing::debug!(restaurant_id, "Empty restaurant, emitting zero summary");
        return summary;
    }

    let total = customers.len();

    summary.spend_distribution = SpendTag::ALL.iter().map(|t| (*t, 0)).collect();
    summary.activity_distribution = ActivityTag::ALL.iter().map(|t| (*t, 0)).collect();

    let mut active = 0usize;
    for customer in customers {
        *summary.spend_distribution.entry(customer.tags.spend_tag).or_insert(0) += 1;
        *summary
            .activity_distribution
            .entry(customer.tags.activity_tag)
            .or_insert(0) += 1;
        for tag in &customer.tags.behavior_tags {
            *summary.behavior_histogram.entry(*tag).or_insert(0) += 1;
        }

        let recent = customer
            .metrics
            .days_since_last_visit(now)
            .is_some_and(|days| days <= config.activity.active_window_days);
        if recent {
            active += 1;
        }
    }

    summary.total_customers = total;
    summary.churn_rate = summary.activity_count(ActivityTag::ChurnRisk) as f64 / total as f64;
    summary.active_rate = active as f64 / total as f64;
    summary.restaurant_avg_visit_gap = baselines.avg_visit_gap;
    summary.top_customers = top_customers(customers, config.spend.top_customer_fraction);

    summary.total_revenue = customers.iter().map(|c| c.metrics.total_spend).sum();
    summary.average_ltv = summary.total_revenue / total as f64;
    summary.median_order_value = baselines.median_order_value.unwrap_or(0.0);
    summary.category_revenue = category_revenue(customers);

    summary
}

/// Top share of customers by lifetime spend, ties broken by id
pub fn top_customers(customers: &[Customer], fraction: f64) -> Vec<TopCustomer> {
    if customers.is_empty() {
        return Vec::new();
    }

    let limit = ((customers.len() as f64 * fraction) - 1e-9).ceil().max(1.0) as usize;

    let mut ranked: Vec<&Customer> = customers
        .iter()
        .filter(|c| c.metrics.total_spend > 0.0)
        .collect();
    ranked.sort_by(|a, b| {
        b.metrics
            .total_spend
            .total_cmp(&a.metrics.total_spend)
            .then_with(|| a.id.cmp(&b.id))
    });

    ranked
        .into_iter()
        .take(limit)
        .map(|c| TopCustomer {
            customer_id: c.id.clone(),
            total_spend: c.metrics.total_spend,
            total_visits: c.metrics.total_visits,
        })
        .collect()
}

fn category_revenue(customers: &[Customer]) -> BTreeMap<String, f64> {
    category_spend(customers.iter().flat_map(|c| c.orders.iter()))
}
