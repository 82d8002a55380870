//! Trigger detection
//!
//! Compares each customer's new tags against the snapshot from the previous
//! run and emits at most one [`AutomationTrigger`] per customer.

use chrono::{DateTime, Utc};

use guest_insights_core::{
    ActivityTag, AutomationTrigger, Customer, PriorTagMap, SpendTag, TagSnapshot, TriggerType,
};

#[derive(Debug, Clone)]
pub struct TriggerDetector {
    milestones: Vec<u32>,
}

impl TriggerDetector {
    pub fn new(milestones: Vec<u32>) -> Self {
        let mut milestones = milestones;
        milestones.sort_unstable();
        milestones.dedup();
        Self { milestones }
    }

    /// Triggers for all customers, in customer order
    pub fn detect(
        &self,
        restaurant_id: &str,
        customers: &[Customer],
        prior: &PriorTagMap,
        now: DateTime<Utc>,
    ) -> Vec<AutomationTrigger> {
        customers
            .iter()
            .filter_map(|c| self.detect_one(restaurant_id, c, prior.get(&c.id), now))
            .collect()
    }

    /// Trigger for a single customer, if their tags moved
    pub fn detect_one(
        &self,
        restaurant_id: &str,
        customer: &Customer,
        prior: Option<&TagSnapshot>,
        now: DateTime<Utc>,
    ) -> Option<AutomationTrigger> {
        let Some(prior) = prior else {
            return Some(AutomationTrigger::new(
                restaurant_id,
                &customer.id,
                TriggerType::NewCustomer,
                None,
                customer.tags.clone(),
                now,
            ));
        };

        if prior.tags == customer.tags {
            return None;
        }

        let trigger_type = self.transition_type(prior, customer);
        tracing::trace!(
            customer_id = %customer.id,
            trigger = %trigger_type,
            "Tag transition"
        );

        Some(AutomationTrigger::new(
            restaurant_id,
            &customer.id,
            trigger_type,
            Some(prior.tags.clone()),
            customer.tags.clone(),
            now,
        ))
    }

    fn transition_type(&self, prior: &TagSnapshot, customer: &Customer) -> TriggerType {
        let old = &prior.tags;
        let new = &customer.tags;

        if new.activity_tag == ActivityTag::ChurnRisk && old.activity_tag != ActivityTag::ChurnRisk {
            TriggerType::ChurnRisk
        } else if new.spend_tag == SpendTag::Vip && old.spend_tag != SpendTag::Vip {
            TriggerType::VipUpgrade
        } else if self
            .crossed_milestone(prior.total_visits, customer.metrics.total_visits)
            .is_some()
        {
            TriggerType::MilestoneReached
        } else {
            TriggerType::TagChanged
        }
    }

    /// Highest milestone `m` with `old < m <= new`
    pub fn crossed_milestone(&self, old_visits: u32, new_visits: u32) -> Option<u32> {
        self.milestones
            .iter()
            .rev()
            .copied()
            .find(|m| old_visits < *m && *m <= new_visits)
    }
}
