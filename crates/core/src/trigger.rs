//! Automation triggers emitted on tag transitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tags::TagSet;

/// Kind of transition a trigger announces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    NewCustomer,
    ChurnRisk,
    VipUpgrade,
    MilestoneReached,
    TagChanged,
}

impl TriggerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerType::NewCustomer => "new_customer",
            TriggerType::ChurnRisk => "churn_risk",
            TriggerType::VipUpgrade => "vip_upgrade",
            TriggerType::MilestoneReached => "milestone_reached",
            TriggerType::TagChanged => "tag_changed",
        }
    }
}

impl std::fmt::Display for TriggerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A detected tag transition, handed to the messaging dispatcher
///
/// Immutable after creation apart from `processed` and `campaign_sent`,
/// which belong to the consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationTrigger {
    pub id: Uuid,
    pub restaurant_id: String,
    pub customer_id: String,
    pub trigger_type: TriggerType,
    /// `None` for a customer seen for the first time
    pub old_tags: Option<TagSet>,
    pub new_tags: TagSet,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub processed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_sent: Option<String>,
}

impl AutomationTrigger {
    pub fn new(
        restaurant_id: impl Into<String>,
        customer_id: impl Into<String>,
        trigger_type: TriggerType,
        old_tags: Option<TagSet>,
        new_tags: TagSet,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            restaurant_id: restaurant_id.into(),
            customer_id: customer_id.into(),
            trigger_type,
            old_tags,
            new_tags,
            created_at,
            processed: false,
            campaign_sent: None,
        }
    }

    /// Consumer acknowledgement
    pub fn mark_processed(&mut self, campaign_sent: Option<String>) {
        self.processed = true;
        if campaign_sent.is_some() {
            self.campaign_sent = campaign_sent;
        }
    }

    /// JSON payload for the messaging dispatcher
    pub fn to_payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::{ActivityTag, SpendTag};
    use chrono::TimeZone;

    #[test]
    fn test_mark_processed_keeps_tags() {
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 8, 0, 0).unwrap();
        let old = TagSet::new(SpendTag::MidSpender, ActivityTag::Active);
        let new = TagSet::new(SpendTag::MidSpender, ActivityTag::ChurnRisk);
        let mut trigger =
            AutomationTrigger::new("r-1", "c-1", TriggerType::ChurnRisk, Some(old.clone()), new.clone(), now);

        assert!(!trigger.processed);
        trigger.mark_processed(Some("winback-march".to_string()));
        assert!(trigger.processed);
        assert_eq!(trigger.campaign_sent.as_deref(), Some("winback-march"));
        assert_eq!(trigger.old_tags, Some(old));
        assert_eq!(trigger.new_tags, new);
    }

    #[test]
    fn test_payload_uses_snake_case_type() {
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 8, 0, 0).unwrap();
        let trigger = AutomationTrigger::new(
            "r-1",
            "c-1",
            TriggerType::VipUpgrade,
            None,
            TagSet::default(),
            now,
        );
        let payload = trigger.to_payload().unwrap();
        assert_eq!(payload["trigger_type"], "vip_upgrade");
        assert_eq!(payload["old_tags"], serde_json::Value::Null);
    }
}
