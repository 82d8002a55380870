//! Restaurant-wide baselines (rollup pass one)
//!
//! Computed once per batch from finalized customer aggregates and then frozen.
//! The classifier reads them; nothing writes them after construction.

use serde::{Deserialize, Serialize};

use guest_insights_config::TaggingConfig;
use guest_insights_core::{Customer, SpendTag};

/// Rank-based spend floors for one restaurant's population
///
/// Floors are the spend values found at fixed ranks of the descending spend
/// list, so membership in a band is a pure function of a customer's spend.
/// Tied spends always share a band: when many customers tie at a floor the
/// band holds more than its nominal share, up to the whole population when
/// everyone spent the same.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpendBands {
    pub vip_floor: f64,
    pub high_floor: f64,
    pub mid_floor: f64,
}

impl SpendBands {
    /// Build from every customer's total spend; `None` for an empty population
    pub fn from_spends(spends: &[f64], vip_fraction: f64) -> Option<Self> {
        if spends.is_empty() {
            return None;
        }

        let mut sorted = spends.to_vec();
        sorted.sort_by(|a, b| b.total_cmp(a));

        let n = sorted.len();
        let vip_rank = ((n as f64 * vip_fraction) - 1e-9).ceil().max(1.0) as usize;
        let high_rank = n.div_ceil(3);
        let mid_rank = (2 * n).div_ceil(3);

        let at_rank = |rank: usize| sorted[rank.clamp(1, n) - 1];

        Some(Self {
            vip_floor: at_rank(vip_rank),
            high_floor: at_rank(high_rank),
            mid_floor: at_rank(mid_rank),
        })
    }

    /// Band for a given lifetime spend
    pub fn classify(&self, total_spend: f64) -> SpendTag {
        if total_spend <= 0.0 {
            SpendTag::LowSpender
        } else if total_spend >= self.vip_floor {
            SpendTag::Vip
        } else if total_spend >= self.high_floor {
            SpendTag::HighSpender
        } else if total_spend >= self.mid_floor {
            SpendTag::MidSpender
        } else {
            SpendTag::LowSpender
        }
    }
}

/// Frozen restaurant statistics passed into classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RestaurantBaselines {
    pub customer_count: usize,
    /// Mean of customers' defined visit gaps
    pub avg_visit_gap: Option<f64>,
    pub spend_bands: Option<SpendBands>,
    /// Median AOV over customers with at least one visit
    pub median_order_value: Option<f64>,
    /// Share of all orders containing a discounted item
    pub discount_order_rate: f64,
}

impl RestaurantBaselines {
    /// Compute from customers whose aggregates are final
    ///
    /// Callers pass customers in a stable order (the pipeline uses id order)
    /// so floating point sums are reproducible.
    pub fn compute(customers: &[Customer], config: &TaggingConfig) -> Self {
        if customers.is_empty() {
            return Self::default();
        }

        let gaps: Vec<f64> = customers
            .iter()
            .filter_map(|c| c.metrics.average_visit_gap)
            .collect();
        let avg_visit_gap = if gaps.is_empty() {
            None
        } else {
            Some(gaps.iter().sum::<f64>() / gaps.len() as f64)
        };

        let spends: Vec<f64> = customers.iter().map(|c| c.metrics.total_spend).collect();
        let spend_bands = SpendBands::from_spends(&spends, config.spend.vip_fraction);

        let order_values: Vec<f64> = customers
            .iter()
            .filter(|c| c.metrics.has_visits())
            .map(|c| c.metrics.average_order_value)
            .collect();

        let total_orders: usize = customers.iter().map(|c| c.orders.len()).sum();
        let discounted_orders: usize = customers
            .iter()
            .map(|c| c.orders.iter().filter(|o| o.has_discount()).count())
            .sum();
        let discount_order_rate = if total_orders == 0 {
            0.0
        } else {
            discounted_orders as f64 / total_orders as f64
        };

        Self {
            customer_count: customers.len(),
            avg_visit_gap,
            spend_bands,
            median_order_value: median(order_values),
            discount_order_rate,
        }
    }

    pub fn spend_tag(&self, total_spend: f64) -> SpendTag {
        self.spend_bands
            .map(|bands| bands.classify(total_spend))
            .unwrap_or(SpendTag::LowSpender)
    }
}

pub(crate) fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_five_of_hundred_are_vip() {
        let spends: Vec<f64> = (1..=100).map(|i| i as f64 * 10.0).collect();
        let bands = SpendBands::from_spends(&spends, 0.05).unwrap();

        let vips: Vec<f64> = spends
            .iter()
            .copied()
            .filter(|s| bands.classify(*s) == SpendTag::Vip)
            .collect();
        assert_eq!(vips, vec![960.0, 970.0, 980.0, 990.0, 1000.0]);
    }

    #[test]
    fn test_bands_partition_population() {
        let spends: Vec<f64> = (1..=30).map(|i| i as f64).collect();
        let bands = SpendBands::from_spends(&spends, 0.05).unwrap();

        let mut counts = std::collections::BTreeMap::new();
        for s in &spends {
            *counts.entry(bands.classify(*s)).or_insert(0) += 1;
        }

        // 30 customers: top tercile 10 (of which 2 vip), then 10 mid, 10 low
        assert_eq!(counts[&SpendTag::Vip], 2);
        assert_eq!(counts[&SpendTag::HighSpender], 8);
        assert_eq!(counts[&SpendTag::MidSpender], 10);
        assert_eq!(counts[&SpendTag::LowSpender], 10);
        assert_eq!(counts.values().sum::<usize>(), 30);
    }

    #[test]
    fn test_vip_is_inside_top_tercile() {
        for n in 1..60 {
            let spends: Vec<f64> = (1..=n).map(|i| (i * 7 % 13) as f64 + 1.0).collect();
            let bands = SpendBands::from_spends(&spends, 0.05).unwrap();
            assert!(bands.vip_floor >= bands.high_floor);
            assert!(bands.high_floor >= bands.mid_floor);
        }
    }

    #[test]
    fn test_tied_spends_share_a_band() {
        let spends = vec![50.0; 20];
        let bands = SpendBands::from_spends(&spends, 0.05).unwrap();
        assert!(spends.iter().all(|s| bands.classify(*s) == SpendTag::Vip));

        // Ties at the vip floor all land in vip
        let mut spends: Vec<f64> = (1..=17).map(|i| i as f64).collect();
        spends.extend([90.0, 90.0, 90.0]);
        let bands = SpendBands::from_spends(&spends, 0.05).unwrap();
        let vips = spends.iter().filter(|s| bands.classify(**s) == SpendTag::Vip).count();
        assert_eq!(vips, 3);
    }

    #[test]
    fn test_zero_spend_is_low() {
        let bands = SpendBands::from_spends(&[0.0, 0.0, 0.0], 0.05).unwrap();
        assert_eq!(bands.classify(0.0), SpendTag::LowSpender);
    }

    #[test]
    fn test_empty_population() {
        assert!(SpendBands::from_spends(&[], 0.05).is_none());
        let baselines = RestaurantBaselines::compute(&[], &TaggingConfig::default());
        assert_eq!(baselines.customer_count, 0);
        assert_eq!(baselines.avg_visit_gap, None);
        assert_eq!(baselines.spend_tag(500.0), SpendTag::LowSpender);
    }

    #[test]
    fn test_median() {
        assert_eq!(median(vec![]), None);
        assert_eq!(median(vec![3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(vec![4.0, 1.0, 2.0, 3.0]), Some(2.5));
    }
}
