//! Customer tag vocabulary
//!
//! A customer always carries exactly one [`SpendTag`], exactly one
//! [`ActivityTag`] and any subset of [`BehaviorTag`]s. Tags are derived from
//! metrics and restaurant baselines on every recomputation and are never
//! edited directly.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Spend band relative to the restaurant's customer population
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpendTag {
    #[default]
    LowSpender,
    MidSpender,
    HighSpender,
    Vip,
}

impl SpendTag {
    pub const ALL: [SpendTag; 4] = [
        SpendTag::LowSpender,
        SpendTag::MidSpender,
        SpendTag::HighSpender,
        SpendTag::Vip,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpendTag::LowSpender => "low_spender",
            SpendTag::MidSpender => "mid_spender",
            SpendTag::HighSpender => "high_spender",
            SpendTag::Vip => "vip",
        }
    }

    /// Display name for dashboards
    pub fn display_name(&self) -> &'static str {
        match self {
            SpendTag::LowSpender => "Low Spender",
            SpendTag::MidSpender => "Mid Spender",
            SpendTag::HighSpender => "High Spender",
            SpendTag::Vip => "VIP",
        }
    }
}

impl std::fmt::Display for SpendTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Visit recency / frequency classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityTag {
    #[default]
    New,
    Active,
    Loyal,
    ChurnRisk,
    Inactive,
}

impl ActivityTag {
    pub const ALL: [ActivityTag; 5] = [
        ActivityTag::New,
        ActivityTag::Active,
        ActivityTag::Loyal,
        ActivityTag::ChurnRisk,
        ActivityTag::Inactive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityTag::New => "new",
            ActivityTag::Active => "active",
            ActivityTag::Loyal => "loyal",
            ActivityTag::ChurnRisk => "churn_risk",
            ActivityTag::Inactive => "inactive",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ActivityTag::New => "New",
            ActivityTag::Active => "Active",
            ActivityTag::Loyal => "Loyal",
            ActivityTag::ChurnRisk => "Churn Risk",
            ActivityTag::Inactive => "Inactive",
        }
    }
}

impl std::fmt::Display for ActivityTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Independent behaviour predicates over the order history
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorTag {
    ComboResponder,
    WeekendOnly,
    CategoryLoyalist,
    LunchRegular,
    DinnerRegular,
    PriceSensitive,
    PremiumSeeker,
    FrequentReviewer,
    Detractor,
    DeliveryPreferred,
}

impl BehaviorTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            BehaviorTag::ComboResponder => "combo_responder",
            BehaviorTag::WeekendOnly => "weekend_only",
            BehaviorTag::CategoryLoyalist => "category_loyalist",
            BehaviorTag::LunchRegular => "lunch_regular",
            BehaviorTag::DinnerRegular => "dinner_regular",
            BehaviorTag::PriceSensitive => "price_sensitive",
            BehaviorTag::PremiumSeeker => "premium_seeker",
            BehaviorTag::FrequentReviewer => "frequent_reviewer",
            BehaviorTag::Detractor => "detractor",
            BehaviorTag::DeliveryPreferred => "delivery_preferred",
        }
    }
}

impl std::fmt::Display for BehaviorTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Full tag tuple of one customer
///
/// The default is the tag set of a customer with no orders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagSet {
    pub spend_tag: SpendTag,
    pub activity_tag: ActivityTag,
    #[serde(default)]
    pub behavior_tags: BTreeSet<BehaviorTag>,
}

impl TagSet {
    pub fn new(spend_tag: SpendTag, activity_tag: ActivityTag) -> Self {
        Self {
            spend_tag,
            activity_tag,
            behavior_tags: BTreeSet::new(),
        }
    }

    pub fn with_behavior(mut self, tag: BehaviorTag) -> Self {
        self.behavior_tags.insert(tag);
        self
    }

    pub fn has_behavior(&self, tag: BehaviorTag) -> bool {
        self.behavior_tags.contains(&tag)
    }

    /// Flat list of tag labels, spend then activity then behaviours
    pub fn labels(&self) -> Vec<&'static str> {
        let mut labels = vec![self.spend_tag.as_str(), self.activity_tag.as_str()];
        labels.extend(self.behavior_tags.iter().map(|t| t.as_str()));
        labels
    }
}

/// Tag state recorded at the end of a previous recomputation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSnapshot {
    pub tags: TagSet,
    /// Visit count the tags were computed from
    #[serde(default)]
    pub total_visits: u32,
}

/// Prior tag state keyed by customer id
pub type PriorTagMap = HashMap<String, TagSnapshot>;
