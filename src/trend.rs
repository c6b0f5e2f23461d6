use crate::category::{categorize, CategoryConfig, Tier};
use crate::ingestion::PerformanceRow;
use crate::period::{is_sortable_key, parse_period_start};
use chrono::NaiveDate;
use log::{debug, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct TierTotals {
    pub cost: f64,
    pub leads: f64,
}

/// Cost and lead sums per tier for one period bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrendPoint {
    pub period: String,
    pub tiers: BTreeMap<Tier, TierTotals>,
}

impl TrendPoint {
    fn new(period: String) -> Self {
        Self {
            period,
            tiers: Tier::ALL
                .iter()
                .map(|tier| (*tier, TierTotals::default()))
                .collect(),
        }
    }

    pub fn cost(&self, tier: Tier) -> f64 {
        self.tiers.get(&tier).map_or(0.0, |t| t.cost)
    }

    pub fn leads(&self, tier: Tier) -> f64 {
        self.tiers.get(&tier).map_or(0.0, |t| t.leads)
    }

    pub fn total_cost(&self) -> f64 {
        self.tiers.values().map(|t| t.cost).sum()
    }

    pub fn total_leads(&self) -> f64 {
        self.tiers.values().map(|t| t.leads).sum()
    }

    pub fn period_start(&self) -> Option<NaiveDate> {
        parse_period_start(&self.period)
    }
}

/// Buckets rows by their raw period text, ordered by string comparison.
///
/// Returns `None` when no row has a period at all, as opposed to an empty
/// series. Rows without a period are left out of the buckets.
pub fn generate_trend(rows: &[PerformanceRow], config: &CategoryConfig) -> Option<Vec<TrendPoint>> {
    if !rows.iter().any(|row| row.period.is_some()) {
        return None;
    }

    let mut buckets: BTreeMap<&str, TrendPoint> = BTreeMap::new();
    for row in rows {
        let Some(period) = row.period.as_deref() else {
            continue;
        };

        let point = buckets
            .entry(period)
            .or_insert_with(|| TrendPoint::new(period.to_string()));
        let totals = point
            .tiers
            .entry(categorize(&row.entity, config))
            .or_default();
        totals.cost += row.cost;
        totals.leads += row.leads;
    }

    if let Some(key) = buckets.keys().find(|key| !is_sortable_key(key)) {
        warn!(
            "Period key '{}' is not ISO formatted; trend order may not be chronological",
            key
        );
    }

    debug!("Generated {} trend points", buckets.len());
    Some(buckets.into_values().collect())
}
