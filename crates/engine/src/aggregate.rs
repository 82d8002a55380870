//! Metric aggregation
//!
//! Folds one customer's order and review history into [`CustomerMetrics`].
//! Pure: the same set of records in any order yields identical metrics, since
//! the history is sorted before anything order-sensitive is computed.

use std::collections::BTreeMap;

use guest_insights_config::constants::ITEMS_PER_GUEST;
use guest_insights_core::{Channel, CustomerMetrics, Order, Review, SECONDS_PER_DAY};

/// Sort orders ascending by timestamp, then id
pub fn sort_orders(orders: &mut [Order]) {
    orders.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
}

/// Aggregate a customer's history into metrics
pub fn aggregate(orders: &[Order], reviews: &[Review]) -> CustomerMetrics {
    let mut history: Vec<&Order> = orders.iter().collect();
    history.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));

    let mut metrics = CustomerMetrics {
        total_visits: history.len() as u32,
        ..Default::default()
    };

    apply_reviews(&mut metrics, reviews);

    let (Some(first), Some(last)) = (history.first(), history.last()) else {
        return metrics;
    };

    let visits = history.len() as f64;
    metrics.first_visit_date = Some(first.timestamp);
    metrics.last_visit_date = Some(last.timestamp);
    metrics.total_spend = history.iter().map(|o| o.total_amount).sum();
    metrics.average_order_value = metrics.total_spend / visits;
    metrics.average_visit_gap = average_visit_gap(&history);
    metrics.guest_estimate_avg = guest_estimate(&history);
    metrics.favorite_category = favorite_category(&history);
    metrics.preferred_channel = preferred_channel(&history);
    metrics.combo_order_rate = history.iter().filter(|o| o.has_combo()).count() as f64 / visits;
    metrics.discount_order_rate =
        history.iter().filter(|o| o.has_discount()).count() as f64 / visits;

    metrics
}

fn apply_reviews(metrics: &mut CustomerMetrics, reviews: &[Review]) {
    metrics.review_count = reviews.len() as u32;
    if reviews.is_empty() {
        return;
    }
    let total: u32 = reviews.iter().map(|r| r.rating as u32).sum();
    metrics.average_rating = Some(total as f64 / reviews.len() as f64);
}

/// Mean days between consecutive visits; `None` below two visits
fn average_visit_gap(history: &[&Order]) -> Option<f64> {
    if history.len() < 2 {
        return None;
    }

    let total_seconds: i64 = history
        .windows(2)
        .map(|pair| (pair[1].timestamp - pair[0].timestamp).num_seconds())
        .sum();

    Some(total_seconds as f64 / SECONDS_PER_DAY / (history.len() - 1) as f64)
}

/// Mean of per-order item quantity / 1.5, rounded, at least one guest
fn guest_estimate(history: &[&Order]) -> u32 {
    if history.is_empty() {
        return 0;
    }

    let total: f64 = history
        .iter()
        .map(|o| o.item_quantity() as f64 / ITEMS_PER_GUEST)
        .sum();

    let mean = (total / history.len() as f64).round() as u32;
    mean.max(1)
}

/// Line spend per category across the history
pub(crate) fn category_spend<'a>(orders: impl IntoIterator<Item = &'a Order>) -> BTreeMap<String, f64> {
    let mut spend = BTreeMap::new();
    for order in orders {
        for item in &order.items {
            *spend.entry(item.category.clone()).or_insert(0.0) += item.line_total();
        }
    }
    spend
}

/// Category with the largest line spend; ties go to the first name
fn favorite_category(history: &[&Order]) -> Option<String> {
    let mut best: Option<(String, f64)> = None;
    for (category, spend) in category_spend(history.iter().copied()) {
        if spend <= 0.0 {
            continue;
        }
        match &best {
            Some((_, best_spend)) if spend <= *best_spend => {},
            _ => best = Some((category, spend)),
        }
    }
    best.map(|(category, _)| category)
}

/// Most frequent channel; ties go to the earlier variant
fn preferred_channel(history: &[&Order]) -> Option<Channel> {
    let mut counts: BTreeMap<Channel, u32> = BTreeMap::new();
    for order in history {
        *counts.entry(order.channel).or_insert(0) += 1;
    }

    let mut best: Option<(Channel, u32)> = None;
    for (channel, count) in counts {
        match best {
            Some((_, best_count)) if count <= best_count => {},
            _ => best = Some((channel, count)),
        }
    }
    best.map(|(channel, _)| channel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use guest_insights_core::LineItem;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap() + Duration::days(n - 1)
    }

    fn order(id: &str, day_n: i64, amount: f64) -> Order {
        Order::new(id, "c-1", day(day_n), amount)
    }

    #[test]
    fn test_weekly_visits_scenario() {
        let orders = vec![order("o1", 1, 100.0), order("o2", 8, 100.0), order("o3", 15, 100.0)];
        let metrics = aggregate(&orders, &[]);

        assert_eq!(metrics.total_visits, 3);
        assert_eq!(metrics.total_spend, 300.0);
        assert_eq!(metrics.average_order_value, 100.0);
        assert_eq!(metrics.average_visit_gap, Some(7.0));
        assert_eq!(metrics.first_visit_date, Some(day(1)));
        assert_eq!(metrics.last_visit_date, Some(day(15)));
    }

    #[test]
    fn test_no_orders() {
        let metrics = aggregate(&[], &[]);
        assert_eq!(metrics.total_visits, 0);
        assert_eq!(metrics.average_order_value, 0.0);
        assert_eq!(metrics.average_visit_gap, None);
        assert_eq!(metrics.guest_estimate_avg, 0);
        assert_eq!(metrics.first_visit_date, None);
    }

    #[test]
    fn test_single_visit_has_no_gap() {
        let metrics = aggregate(&[order("o1", 3, 42.0)], &[]);
        assert_eq!(metrics.total_visits, 1);
        assert_eq!(metrics.average_order_value, 42.0);
        assert_eq!(metrics.average_visit_gap, None);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let a = vec![order("o1", 1, 10.5), order("o2", 4, 20.25), order("o3", 20, 7.0)];
        let mut b = a.clone();
        b.reverse();
        assert_eq!(aggregate(&a, &[]), aggregate(&b, &[]));
    }

    #[test]
    fn test_guest_estimate() {
        // 3 items -> 2 guests, 1 item -> 0.67 guests; mean 1.33 -> 1
        let orders = vec![
            order("o1", 1, 30.0).with_items(vec![LineItem::new("a", "mains", 10.0, 3)]),
            order("o2", 2, 10.0).with_items(vec![LineItem::new("b", "drinks", 10.0, 1)]),
        ];
        assert_eq!(aggregate(&orders, &[]).guest_estimate_avg, 1);

        // 6 items -> 4 guests
        let orders = vec![order("o1", 1, 60.0).with_items(vec![LineItem::new("a", "mains", 10.0, 6)])];
        assert_eq!(aggregate(&orders, &[]).guest_estimate_avg, 4);

        // No items still counts one guest
        assert_eq!(aggregate(&[order("o1", 1, 5.0)], &[]).guest_estimate_avg, 1);
    }

    #[test]
    fn test_favorite_category_and_channel() {
        let orders = vec![
            order("o1", 1, 30.0)
                .with_items(vec![
                    LineItem::new("pizza", "mains", 20.0, 1),
                    LineItem::new("cola", "drinks", 5.0, 2),
                ])
                .with_channel(Channel::Delivery),
            order("o2", 2, 12.0)
                .with_items(vec![LineItem::new("tiramisu", "desserts", 12.0, 1)])
                .with_channel(Channel::Delivery),
            order("o3", 3, 8.0).with_channel(Channel::DineIn),
        ];
        let metrics = aggregate(&orders, &[]);
        assert_eq!(metrics.favorite_category.as_deref(), Some("mains"));
        assert_eq!(metrics.preferred_channel, Some(Channel::Delivery));
    }

    #[test]
    fn test_combo_and_discount_rates() {
        let orders = vec![
            order("o1", 1, 15.0).with_items(vec![LineItem::new("meal", "combos", 15.0, 1).combo()]),
            order("o2", 2, 9.0).with_items(vec![LineItem::new("wrap", "mains", 9.0, 1).discounted()]),
            order("o3", 3, 9.0).with_items(vec![LineItem::new("wrap", "mains", 9.0, 1)]),
            order("o4", 4, 9.0),
        ];
        let metrics = aggregate(&orders, &[]);
        assert_eq!(metrics.combo_order_rate, 0.25);
        assert_eq!(metrics.discount_order_rate, 0.25);
    }

    #[test]
    fn test_reviews() {
        let reviews: Vec<Review> = [5u8, 4, 2]
            .iter()
            .enumerate()
            .map(|(i, rating)| Review {
                id: format!("r{}", i),
                customer_id: "c-1".to_string(),
                order_id: None,
                rating: *rating,
                created_at: day(i as i64 + 1),
            })
            .collect();

        let metrics = aggregate(&[order("o1", 1, 10.0)], &reviews);
        assert_eq!(metrics.review_count, 3);
        assert_eq!(metrics.average_rating, Some(11.0 / 3.0));

        assert_eq!(aggregate(&[], &[]).average_rating, None);
    }

    #[test]
    fn test_adding_an_order_is_monotonic() {
        let mut orders = vec![order("o1", 1, 12.0), order("o2", 5, 0.0)];
        let before = aggregate(&orders, &[]);
        orders.push(order("o3", 9, 0.0));
        let after = aggregate(&orders, &[]);

        assert!(after.total_visits > before.total_visits);
        assert!(after.total_spend >= before.total_spend);
    }

    #[test]
    fn test_sort_orders() {
        let mut orders = vec![order("b", 2, 1.0), order("a", 2, 1.0), order("c", 1, 1.0)];
        sort_orders(&mut orders);
        let ids: Vec<&str> = orders.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }
}
