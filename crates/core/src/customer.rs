//! Customer profile, aggregate metrics and tags

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::order::{Channel, Order};
use crate::tags::{TagSet, TagSnapshot};

/// Contact details known for a customer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerContact {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl CustomerContact {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Set customer name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }
}

/// Scalar aggregates folded from a customer's history
///
/// `average_visit_gap` and `average_rating` are `None` when there is not
/// enough history to define them. Callers must read that as "unknown", not
/// as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerMetrics {
    pub first_visit_date: Option<DateTime<Utc>>,
    pub last_visit_date: Option<DateTime<Utc>>,
    pub total_visits: u32,
    /// Lifetime value
    pub total_spend: f64,
    pub average_order_value: f64,
    /// Mean days between consecutive visits
    pub average_visit_gap: Option<f64>,
    pub guest_estimate_avg: u32,
    pub review_count: u32,
    pub average_rating: Option<f64>,
    pub favorite_category: Option<String>,
    pub preferred_channel: Option<Channel>,
    /// Share of orders containing a combo item
    pub combo_order_rate: f64,
    /// Share of orders containing a discounted item
    pub discount_order_rate: f64,
}

impl CustomerMetrics {
    pub fn has_visits(&self) -> bool {
        self.total_visits > 0
    }

    /// Days from the last visit to `now`, `None` without visits
    pub fn days_since_last_visit(&self, now: DateTime<Utc>) -> Option<f64> {
        self.last_visit_date
            .map(|last| (now - last).num_seconds() as f64 / SECONDS_PER_DAY)
    }
}

pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// A restaurant's customer with derived metrics and tags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    pub metrics: CustomerMetrics,

    pub tags: TagSet,

    /// Orders ascending by timestamp
    #[serde(default)]
    pub orders: Vec<Order>,
}

impl Customer {
    /// Create from contact details with empty metrics and default tags
    pub fn from_contact(contact: CustomerContact) -> Self {
        Self {
            id: contact.id,
            name: contact.name,
            email: contact.email,
            phone: contact.phone,
            metrics: CustomerMetrics::default(),
            tags: TagSet::default(),
            orders: Vec::new(),
        }
    }

    /// Get display name (name or "Guest")
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Guest")
    }

    /// Snapshot used as prior state by the next recomputation
    pub fn tag_snapshot(&self) -> TagSnapshot {
        TagSnapshot {
            tags: self.tags.clone(),
            total_visits: self.metrics.total_visits,
        }
    }
}
