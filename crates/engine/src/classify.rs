//! Tag classification (rollup pass two)

use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc, Weekday};

use guest_insights_config::TaggingConfig;
use guest_insights_core::{ActivityTag, BehaviorTag, Customer, CustomerMetrics, Order, SpendTag, TagSet};

use crate::aggregate::category_spend;
use crate::baselines::RestaurantBaselines;

/// Tolerance for share comparisons so that 3 of 10 meets a 0.30 threshold
const SHARE_EPSILON: f64 = 1e-9;

/// Everything classification reads besides the customer itself
#[derive(Debug, Clone, Copy)]
pub struct ClassifyContext<'a> {
    pub baselines: &'a RestaurantBaselines,
    /// Restaurant local offset for weekday and meal slot rules
    pub offset: FixedOffset,
    pub now: DateTime<Utc>,
}

/// Assigns spend, activity and behaviour tags from metrics and baselines
#[derive(Debug, Clone)]
pub struct TagClassifier {
    config: TaggingConfig,
}

impl TagClassifier {
    pub fn new(config: TaggingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TaggingConfig {
        &self.config
    }

    /// Full tag set for a customer whose metrics are already aggregated
    pub fn classify(&self, customer: &Customer, ctx: &ClassifyContext<'_>) -> TagSet {
        if !customer.metrics.has_visits() {
            return TagSet::default();
        }

        TagSet {
            spend_tag: self.spend_tag(&customer.metrics, ctx.baselines),
            activity_tag: self.activity_tag(&customer.metrics, ctx.baselines, ctx.now),
            behavior_tags: self.behavior_tags(customer, ctx).into_iter().collect(),
        }
    }

    pub fn spend_tag(&self, metrics: &CustomerMetrics, baselines: &RestaurantBaselines) -> SpendTag {
        baselines.spend_tag(metrics.total_spend)
    }

    /// First matching rule wins: inactive, churn_risk, new, loyal, active
    pub fn activity_tag(
        &self,
        metrics: &CustomerMetrics,
        baselines: &RestaurantBaselines,
        now: DateTime<Utc>,
    ) -> ActivityTag {
        let thresholds = &self.config.activity;
        let Some(days_since) = metrics.days_since_last_visit(now) else {
            return ActivityTag::New;
        };

        let inactive_after = match baselines.avg_visit_gap {
            Some(gap) => (gap * thresholds.inactive_gap_multiplier).max(thresholds.inactive_min_days),
            None => thresholds.inactive_min_days,
        };
        if days_since > inactive_after {
            return ActivityTag::Inactive;
        }

        if metrics.total_visits > 1 {
            let reference_gap = baselines.avg_visit_gap.or(metrics.average_visit_gap);
            if let Some(gap) = reference_gap {
                if days_since > gap * thresholds.churn_gap_multiplier {
                    return ActivityTag::ChurnRisk;
                }
            }
        }

        if metrics.total_visits <= 1 {
            return ActivityTag::New;
        }

        if metrics.total_visits >= thresholds.loyal_min_visits {
            if let (Some(own), Some(restaurant)) = (metrics.average_visit_gap, baselines.avg_visit_gap) {
                if own <= restaurant {
                    return ActivityTag::Loyal;
                }
            }
        }

        ActivityTag::Active
    }

    /// Behaviour predicates, empty below the minimum order count
    pub fn behavior_tags(&self, customer: &Customer, ctx: &ClassifyContext<'_>) -> Vec<BehaviorTag> {
        let b = &self.config.behavior;
        let orders = &customer.orders;
        let metrics = &customer.metrics;
        let total = orders.len();

        if total == 0 || total < b.min_orders as usize {
            return Vec::new();
        }

        let mut tags = Vec::new();

        let combos = orders.iter().filter(|o| o.has_combo()).count();
        if meets_share(combos, total, b.combo_share) {
            tags.push(BehaviorTag::ComboResponder);
        }

        let weekend = orders.iter().filter(|o| is_weekend(o, ctx.offset)).count();
        if meets_share(weekend, total, b.weekend_share) {
            tags.push(BehaviorTag::WeekendOnly);
        }

        if is_category_loyalist(orders, b.category_share) {
            tags.push(BehaviorTag::CategoryLoyalist);
        }

        let lunch = count_in_window(orders, ctx.offset, |h| b.lunch_hours.contains(h));
        if meets_share(lunch, total, b.meal_slot_share) {
            tags.push(BehaviorTag::LunchRegular);
        }

        let dinner = count_in_window(orders, ctx.offset, |h| b.dinner_hours.contains(h));
        if meets_share(dinner, total, b.meal_slot_share) {
            tags.push(BehaviorTag::DinnerRegular);
        }

        if let Some(median) = ctx.baselines.median_order_value {
            let pooled = ctx.baselines.discount_order_rate;
            if metrics.average_order_value < median && metrics.discount_order_rate > pooled {
                tags.push(BehaviorTag::PriceSensitive);
            }
            if metrics.average_order_value > median && metrics.discount_order_rate <= pooled {
                tags.push(BehaviorTag::PremiumSeeker);
            }
        }

        if meets_share(metrics.review_count as usize, total, b.frequent_reviewer_ratio) {
            tags.push(BehaviorTag::FrequentReviewer);
        }

        if let Some(rating) = metrics.average_rating {
            if rating <= b.detractor_max_rating {
                tags.push(BehaviorTag::Detractor);
            }
        }

        let remote = orders.iter().filter(|o| o.channel.is_remote()).count();
        if meets_share(remote, total, b.delivery_share) {
            tags.push(BehaviorTag::DeliveryPreferred);
        }

        tags
    }
}

fn meets_share(count: usize, total: usize, share: f64) -> bool {
    total > 0 && count as f64 + SHARE_EPSILON >= share * total as f64
}

fn is_weekend(order: &Order, offset: FixedOffset) -> bool {
    matches!(order.local_time(offset).weekday(), Weekday::Sat | Weekday::Sun)
}

fn count_in_window(orders: &[Order], offset: FixedOffset, in_window: impl Fn(u32) -> bool) -> usize {
    orders
        .iter()
        .filter(|o| in_window(o.local_time(offset).hour()))
        .count()
}

fn is_category_loyalist(orders: &[Order], share: f64) -> bool {
    let spend = category_spend(orders.iter());
    let total: f64 = spend.values().sum();
    if total <= 0.0 {
        return false;
    }
    spend
        .values()
        .any(|category| *category + SHARE_EPSILON >= share * total)
}
