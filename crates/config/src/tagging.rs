//! Tagging thresholds
//!
//! Every number the classifier compares against lives here so that product
//! can tune churn windows, quantiles and behaviour shares per deployment.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::{activity, behavior, spend, VISIT_MILESTONES};
use crate::ConfigError;

/// Thresholds consumed by the tag classifier and trigger detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggingConfig {
    #[serde(default)]
    pub activity: ActivityThresholds,

    #[serde(default)]
    pub spend: SpendThresholds,

    #[serde(default)]
    pub behavior: BehaviorThresholds,

    /// Visit counts that produce a milestone trigger when crossed
    #[serde(default = "default_milestones")]
    pub milestones: Vec<u32>,
}

fn default_milestones() -> Vec<u32> {
    VISIT_MILESTONES.to_vec()
}

impl Default for TaggingConfig {
    fn default() -> Self {
        Self {
            activity: ActivityThresholds::default(),
            spend: SpendThresholds::default(),
            behavior: BehaviorThresholds::default(),
            milestones: default_milestones(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityThresholds {
    #[serde(default = "default_churn_gap_multiplier")]
    pub churn_gap_multiplier: f64,

    #[serde(default = "default_inactive_gap_multiplier")]
    pub inactive_gap_multiplier: f64,

    #[serde(default = "default_inactive_min_days")]
    pub inactive_min_days: f64,

    #[serde(default = "default_loyal_min_visits")]
    pub loyal_min_visits: u32,

    #[serde(default = "default_active_window_days")]
    pub active_window_days: f64,
}

fn default_churn_gap_multiplier() -> f64 {
    activity::CHURN_GAP_MULTIPLIER
}
fn default_inactive_gap_multiplier() -> f64 {
    activity::INACTIVE_GAP_MULTIPLIER
}
fn default_inactive_min_days() -> f64 {
    activity::INACTIVE_MIN_DAYS
}
fn default_loyal_min_visits() -> u32 {
    activity::LOYAL_MIN_VISITS
}
fn default_active_window_days() -> f64 {
    activity::ACTIVE_WINDOW_DAYS
}

impl Default for ActivityThresholds {
    fn default() -> Self {
        Self {
            churn_gap_multiplier: default_churn_gap_multiplier(),
            inactive_gap_multiplier: default_inactive_gap_multiplier(),
            inactive_min_days: default_inactive_min_days(),
            loyal_min_visits: default_loyal_min_visits(),
            active_window_days: default_active_window_days(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendThresholds {
    /// Top share of customers by spend tagged vip
    #[serde(default = "default_vip_fraction")]
    pub vip_fraction: f64,

    /// Top share of customers by spend listed in the summary
    #[serde(default = "default_top_customer_fraction")]
    pub top_customer_fraction: f64,
}

fn default_vip_fraction() -> f64 {
    spend::VIP_FRACTION
}
fn default_top_customer_fraction() -> f64 {
    spend::TOP_CUSTOMER_FRACTION
}

impl Default for SpendThresholds {
    fn default() -> Self {
        Self {
            vip_fraction: default_vip_fraction(),
            top_customer_fraction: default_top_customer_fraction(),
        }
    }
}

/// Local-time hour window, start inclusive, end exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourWindow {
    pub start: u32,
    pub end: u32,
}

impl HourWindow {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, hour: u32) -> bool {
        hour >= self.start && hour < self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorThresholds {
    /// Orders required before any behaviour tag is evaluated
    #[serde(default = "default_min_orders")]
    pub min_orders: u32,

    #[serde(default = "default_combo_share")]
    pub combo_share: f64,

    #[serde(default = "default_weekend_share")]
    pub weekend_share: f64,

    #[serde(default = "default_category_share")]
    pub category_share: f64,

    #[serde(default = "default_meal_slot_share")]
    pub meal_slot_share: f64,

    #[serde(default = "default_delivery_share")]
    pub delivery_share: f64,

    #[serde(default = "default_frequent_reviewer_ratio")]
    pub frequent_reviewer_ratio: f64,

    #[serde(default = "default_detractor_max_rating")]
    pub detractor_max_rating: f64,

    #[serde(default = "default_lunch_hours")]
    pub lunch_hours: HourWindow,

    #[serde(default = "default_dinner_hours")]
    pub dinner_hours: HourWindow,
}

fn default_min_orders() -> u32 {
    behavior::MIN_ORDERS
}
fn default_combo_share() -> f64 {
    behavior::COMBO_SHARE
}
fn default_weekend_share() -> f64 {
    behavior::WEEKEND_SHARE
}
fn default_category_share() -> f64 {
    behavior::CATEGORY_SHARE
}
fn default_meal_slot_share() -> f64 {
    behavior::MEAL_SLOT_SHARE
}
fn default_delivery_share() -> f64 {
    behavior::DELIVERY_SHARE
}
fn default_frequent_reviewer_ratio() -> f64 {
    behavior::FREQUENT_REVIEWER_RATIO
}
fn default_detractor_max_rating() -> f64 {
    behavior::DETRACTOR_MAX_RATING
}
fn default_lunch_hours() -> HourWindow {
    HourWindow::new(behavior::LUNCH_HOURS.0, behavior::LUNCH_HOURS.1)
}
fn default_dinner_hours() -> HourWindow {
    HourWindow::new(behavior::DINNER_HOURS.0, behavior::DINNER_HOURS.1)
}

impl Default for BehaviorThresholds {
    fn default() -> Self {
        Self {
            min_orders: default_min_orders(),
            combo_share: default_combo_share(),
            weekend_share: default_weekend_share(),
            category_share: default_category_share(),
            meal_slot_share: default_meal_slot_share(),
            delivery_share: default_delivery_share(),
            frequent_reviewer_ratio: default_frequent_reviewer_ratio(),
            detractor_max_rating: default_detractor_max_rating(),
            lunch_hours: default_lunch_hours(),
            dinner_hours: default_dinner_hours(),
        }
    }
}

impl TaggingConfig {
    /// Load from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|_| ConfigError::FileNotFound(path.as_ref().display().to_string()))?;

        let config: Self =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate thresholds
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_activity()?;
        self.validate_spend()?;
        self.validate_behavior()?;

        if self.milestones.iter().any(|m| *m == 0) {
            return Err(ConfigError::InvalidValue {
                field: "tagging.milestones".to_string(),
                message: "Milestones must be positive visit counts".to_string(),
            });
        }

        Ok(())
    }

    fn validate_activity(&self) -> Result<(), ConfigError> {
        let a = &self.activity;

        if !(a.churn_gap_multiplier > 0.0) {
            return Err(invalid(
                "tagging.activity.churn_gap_multiplier",
                format!("Must be positive, got {}", a.churn_gap_multiplier),
            ));
        }

        // churn_risk would be unreachable behind inactive otherwise
        if a.inactive_gap_multiplier < a.churn_gap_multiplier {
            return Err(invalid(
                "tagging.activity.inactive_gap_multiplier",
                format!(
                    "Must be at least churn_gap_multiplier ({}), got {}",
                    a.churn_gap_multiplier, a.inactive_gap_multiplier
                ),
            ));
        }

        if !(a.inactive_min_days > 0.0) {
            return Err(invalid(
                "tagging.activity.inactive_min_days",
                format!("Must be positive, got {}", a.inactive_min_days),
            ));
        }

        if a.loyal_min_visits < 2 {
            return Err(invalid(
                "tagging.activity.loyal_min_visits",
                format!("Must be at least 2, got {}", a.loyal_min_visits),
            ));
        }

        if !(a.active_window_days > 0.0) {
            return Err(invalid(
                "tagging.activity.active_window_days",
                format!("Must be positive, got {}", a.active_window_days),
            ));
        }

        Ok(())
    }

    fn validate_spend(&self) -> Result<(), ConfigError> {
        check_fraction("tagging.spend.vip_fraction", self.spend.vip_fraction)?;
        if self.spend.vip_fraction > 1.0 / 3.0 {
            return Err(invalid(
                "tagging.spend.vip_fraction",
                format!(
                    "Must fit inside the top tercile, got {}",
                    self.spend.vip_fraction
                ),
            ));
        }
        check_fraction(
            "tagging.spend.top_customer_fraction",
            self.spend.top_customer_fraction,
        )
    }

    fn validate_behavior(&self) -> Result<(), ConfigError> {
        let b = &self.behavior;

        check_fraction("tagging.behavior.combo_share", b.combo_share)?;
        check_fraction("tagging.behavior.weekend_share", b.weekend_share)?;
        check_fraction("tagging.behavior.category_share", b.category_share)?;
        check_fraction("tagging.behavior.meal_slot_share", b.meal_slot_share)?;
        check_fraction("tagging.behavior.delivery_share", b.delivery_share)?;
        check_fraction(
            "tagging.behavior.frequent_reviewer_ratio",
            b.frequent_reviewer_ratio,
        )?;

        if !(1.0..=5.0).contains(&b.detractor_max_rating) {
            return Err(invalid(
                "tagging.behavior.detractor_max_rating",
                format!("Must be between 1.0 and 5.0, got {}", b.detractor_max_rating),
            ));
        }

        check_window("tagging.behavior.lunch_hours", b.lunch_hours)?;
        check_window("tagging.behavior.dinner_hours", b.dinner_hours)?;

        Ok(())
    }
}

fn invalid(field: &str, message: String) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message,
    }
}

fn check_fraction(field: &str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(invalid(
            field,
            format!("Must be in (0.0, 1.0], got {}", value),
        ))
    }
}

fn check_window(field: &str, window: HourWindow) -> Result<(), ConfigError> {
    if window.start < window.end && window.end <= 24 {
        Ok(())
    } else {
        Err(invalid(
            field,
            format!(
                "Must satisfy start < end <= 24, got {}..{}",
                window.start, window.end
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = TaggingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.activity.churn_gap_multiplier, 2.0);
        assert_eq!(config.activity.inactive_min_days, 60.0);
        assert_eq!(config.milestones, vec![10, 25, 50, 100]);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
activity:
  churn_gap_multiplier: 3.0
behavior:
  lunch_hours: { start: 12, end: 14 }
"#;
        let config: TaggingConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.activity.churn_gap_multiplier, 3.0);
        assert_eq!(config.activity.inactive_gap_multiplier, 4.0);
        assert_eq!(config.behavior.lunch_hours, HourWindow::new(12, 14));
        assert_eq!(config.behavior.dinner_hours, HourWindow::new(17, 22));
        assert_eq!(config.spend.vip_fraction, 0.05);
    }

    #[test]
    fn test_inactive_multiplier_below_churn_is_rejected() {
        let mut config = TaggingConfig::default();
        config.activity.inactive_gap_multiplier = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "tagging.activity.inactive_gap_multiplier"
        ));
    }

    #[test]
    fn test_fraction_bounds() {
        let mut config = TaggingConfig::default();
        config.behavior.weekend_share = 1.2;
        assert!(config.validate().is_err());

        let mut config = TaggingConfig::default();
        config.spend.vip_fraction = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_hour_window() {
        let lunch = HourWindow::new(11, 15);
        assert!(lunch.contains(11));
        assert!(lunch.contains(14));
        assert!(!lunch.contains(15));

        let mut config = TaggingConfig::default();
        config.behavior.dinner_hours = HourWindow::new(22, 17);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "activity:\n  loyal_min_visits: 8\nmilestones: [5, 20]").unwrap();

        let config = TaggingConfig::load(file.path()).unwrap();
        assert_eq!(config.activity.loyal_min_visits, 8);
        assert_eq!(config.milestones, vec![5, 20]);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            TaggingConfig::load("/nonexistent/tagging.yaml"),
            Err(ConfigError::FileNotFound(_))
        ));
    }
}
