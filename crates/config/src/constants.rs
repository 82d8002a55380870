//! Default thresholds for the tagging engine
//!
//! Single source of truth for the numbers [`crate::TaggingConfig`] falls back
//! to. Every value here can be overridden through settings.

/// Recency and cadence rules for activity tags
pub mod activity {
    /// Churn risk once days since last visit exceed this multiple of the
    /// restaurant's average visit gap
    pub const CHURN_GAP_MULTIPLIER: f64 = 2.0;

    /// Inactive once days since last visit exceed this multiple of the gap...
    pub const INACTIVE_GAP_MULTIPLIER: f64 = 4.0;

    /// ...or this many days, whichever is larger
    pub const INACTIVE_MIN_DAYS: f64 = 60.0;

    /// Visits needed before a customer can be loyal
    pub const LOYAL_MIN_VISITS: u32 = 5;

    /// Trailing window for the active rate
    pub const ACTIVE_WINDOW_DAYS: f64 = 30.0;
}

/// Population quantiles for spend tags
pub mod spend {
    /// Top share of the population tagged vip
    pub const VIP_FRACTION: f64 = 0.05;

    /// Top share of the population listed in the summary
    pub const TOP_CUSTOMER_FRACTION: f64 = 0.10;
}

/// Behaviour predicate thresholds (shares of orders or spend)
pub mod behavior {
    pub const MIN_ORDERS: u32 = 1;
    pub const COMBO_SHARE: f64 = 0.30;
    pub const WEEKEND_SHARE: f64 = 0.80;
    pub const CATEGORY_SHARE: f64 = 0.60;
    pub const MEAL_SLOT_SHARE: f64 = 0.50;
    pub const DELIVERY_SHARE: f64 = 0.60;
    pub const FREQUENT_REVIEWER_RATIO: f64 = 0.50;
    pub const DETRACTOR_MAX_RATING: f64 = 2.0;

    /// Local hours, start inclusive, end exclusive
    pub const LUNCH_HOURS: (u32, u32) = (11, 15);
    pub const DINNER_HOURS: (u32, u32) = (17, 22);
}

/// Visit counts announced with a milestone trigger
pub const VISIT_MILESTONES: [u32; 4] = [10, 25, 50, 100];

/// Guest heuristic: items ordered per guest
pub const ITEMS_PER_GUEST: f64 = 1.5;
