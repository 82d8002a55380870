//! Order records
//!
//! [`OrderRecord`] is what the external store hands us and may be incomplete.
//! [`Order`] is the validated form the engine aggregates over.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RecordIssue;

/// Channel an order came through
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    #[default]
    DineIn,
    Takeaway,
    Delivery,
    Online,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::DineIn => "dine_in",
            Channel::Takeaway => "takeaway",
            Channel::Delivery => "delivery",
            Channel::Online => "online",
        }
    }

    /// Orders that never reach a table
    pub fn is_remote(&self) -> bool {
        matches!(self, Channel::Delivery | Channel::Online)
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One line of an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default = "default_category")]
    pub category: String,

    /// Unit price
    #[serde(default)]
    pub price: f64,

    #[serde(default = "default_quantity")]
    pub quantity: u32,

    #[serde(default)]
    pub is_combo: bool,

    #[serde(default)]
    pub is_discounted: bool,
}

fn default_quantity() -> u32 {
    1
}

/// Category for lines the menu never classified
pub const UNCATEGORIZED: &str = "uncategorized";

fn default_category() -> String {
    UNCATEGORIZED.to_string()
}

impl LineItem {
    pub fn new(id: impl Into<String>, category: impl Into<String>, price: f64, quantity: u32) -> Self {
        Self {
            id: id.into(),
            name: None,
            category: category.into(),
            price,
            quantity,
            is_combo: false,
            is_discounted: false,
        }
    }

    pub fn combo(mut self) -> Self {
        self.is_combo = true;
        self
    }

    pub fn discounted(mut self) -> Self {
        self.is_discounted = true;
        self
    }

    /// Price times quantity
    pub fn line_total(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

/// Raw order as read from the external store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: String,

    #[serde(default)]
    pub customer_id: Option<String>,

    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,

    #[serde(default)]
    pub items: Vec<LineItem>,

    #[serde(default)]
    pub total_amount: Option<f64>,

    #[serde(default)]
    pub guest_count: Option<u32>,

    #[serde(default)]
    pub channel: Channel,
}

impl OrderRecord {
    /// Check required fields and produce an [`Order`]
    pub fn validate(self) -> Result<Order, RecordIssue> {
        let customer_id = match self.customer_id {
            Some(id) if !id.trim().is_empty() => id,
            _ => return Err(RecordIssue::MissingCustomer { record_id: self.id }),
        };

        let Some(timestamp) = self.timestamp else {
            return Err(RecordIssue::MissingTimestamp { record_id: self.id });
        };

        let total_amount = match self.total_amount {
            None => return Err(RecordIssue::MissingAmount { record_id: self.id }),
            Some(amount) if !amount.is_finite() || amount < 0.0 => {
                return Err(RecordIssue::InvalidAmount {
                    record_id: self.id,
                    amount,
                })
            },
            Some(amount) => amount,
        };

        Ok(Order {
            id: self.id,
            customer_id,
            timestamp,
            items: self.items,
            total_amount,
            guest_count: self.guest_count,
            channel: self.channel,
        })
    }
}

impl TryFrom<OrderRecord> for Order {
    type Error = RecordIssue;

    fn try_from(record: OrderRecord) -> Result<Self, Self::Error> {
        record.validate()
    }
}

/// Validated order. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub customer_id: String,
    pub timestamp: DateTime<Utc>,
    pub items: Vec<LineItem>,
    pub total_amount: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_count: Option<u32>,

    pub channel: Channel,
}

impl Order {
    pub fn new(
        id: impl Into<String>,
        customer_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        total_amount: f64,
    ) -> Self {
        Self {
            id: id.into(),
            customer_id: customer_id.into(),
            timestamp,
            items: Vec::new(),
            total_amount,
            guest_count: None,
            channel: Channel::DineIn,
        }
    }

    pub fn with_items(mut self, items: Vec<LineItem>) -> Self {
        self.items = items;
        self
    }

    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channel = channel;
        self
    }

    /// Sum of item quantities
    pub fn item_quantity(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn has_combo(&self) -> bool {
        self.items.iter().any(|i| i.is_combo)
    }

    pub fn has_discount(&self) -> bool {
        self.items.iter().any(|i| i.is_discounted)
    }

    /// Timestamp in the restaurant's local time
    pub fn local_time(&self, offset: FixedOffset) -> DateTime<FixedOffset> {
        self.timestamp.with_timezone(&offset)
    }
}
