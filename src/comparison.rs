use crate::analysis::AnalysisResult;
use crate::category::{categorize, CategoryConfig, Tier};
use crate::metrics::AggregatedMetrics;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Deltas smaller than this (absolute) display as unchanged.
pub const UNCHANGED_THRESHOLD: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeltaDirection {
    Increase,
    Decrease,
    Unchanged,
}

impl DeltaDirection {
    pub fn classify(delta: f64) -> Self {
        if delta.abs() < UNCHANGED_THRESHOLD {
            DeltaDirection::Unchanged
        } else if delta > 0.0 {
            DeltaDirection::Increase
        } else {
            DeltaDirection::Decrease
        }
    }
}

/// One entity seen in either analysis. A side the entity is missing from
/// holds all-zero metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityComparison {
    pub name: String,
    pub in_base: bool,
    pub in_current: bool,
    pub base: AggregatedMetrics,
    pub current: AggregatedMetrics,
    pub cost_delta: f64,
    pub leads_delta: f64,
    pub promotion_cost_delta: f64,
}

impl EntityComparison {
    fn new(name: &str, base: Option<&AggregatedMetrics>, current: Option<&AggregatedMetrics>) -> Self {
        let base_metrics = base.copied().unwrap_or_default();
        let current_metrics = current.copied().unwrap_or_default();

        Self {
            name: name.to_string(),
            in_base: base.is_some(),
            in_current: current.is_some(),
            cost_delta: current_metrics.total_cost - base_metrics.total_cost,
            leads_delta: current_metrics.total_leads - base_metrics.total_leads,
            promotion_cost_delta: current_metrics.promotion_cost - base_metrics.promotion_cost,
            base: base_metrics,
            current: current_metrics,
        }
    }

    /// Promotion cost delta when both sides have leads; otherwise one side's
    /// cost per lead is undefined and so is the difference.
    pub fn comparable_promotion_cost_delta(&self) -> Option<f64> {
        (self.base.total_leads > 0.0 && self.current.total_leads > 0.0)
            .then_some(self.promotion_cost_delta)
    }

    /// Cost used for ordering: current when present, else base.
    fn sort_cost(&self) -> f64 {
        if self.in_current {
            self.current.total_cost
        } else {
            self.base.total_cost
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    pub base_global: AggregatedMetrics,
    pub current_global: AggregatedMetrics,
    pub global_cost_delta: f64,
    pub global_leads_delta: f64,
    pub tiers: BTreeMap<Tier, Vec<EntityComparison>>,
}

impl ComparisonReport {
    pub fn tier(&self, tier: Tier) -> &[EntityComparison] {
        self.tiers.get(&tier).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn entity(&self, name: &str) -> Option<&EntityComparison> {
        self.tiers.values().flatten().find(|e| e.name == name)
    }

    pub fn entity_count(&self) -> usize {
        self.tiers.values().map(Vec::len).sum()
    }
}

/// Aligns two analyses by entity name and regroups the union under `config`,
/// the config in effect now rather than either analysis's own.
pub fn compare(base: &AnalysisResult, current: &AnalysisResult, config: &CategoryConfig) -> ComparisonReport {
    let base_map = flatten(base);
    let current_map = flatten(current);

    let mut tiers: BTreeMap<Tier, Vec<EntityComparison>> =
        Tier::ALL.iter().map(|tier| (*tier, Vec::new())).collect();

    for name in union_names(base, current) {
        let entry = EntityComparison::new(name, base_map.get(name).copied(), current_map.get(name).copied());
        tiers.entry(categorize(name, config)).or_default().push(entry);
    }

    for entries in tiers.values_mut() {
        entries.sort_by(|a, b| b.sort_cost().total_cmp(&a.sort_cost()));
    }

    let report = ComparisonReport {
        base_global: base.global,
        current_global: current.global,
        global_cost_delta: current.global.total_cost - base.global.total_cost,
        global_leads_delta: current.global.total_leads - base.global.total_leads,
        tiers,
    };

    debug!(
        "Compared {} entities, global cost delta {:.2}",
        report.entity_count(),
        report.global_cost_delta
    );

    report
}

fn flatten(analysis: &AnalysisResult) -> HashMap<&str, &AggregatedMetrics> {
    analysis
        .entities()
        .map(|e| (e.name.as_str(), &e.metrics))
        .collect()
}

/// Base entities first, then entities new in current, each in tier order.
fn union_names<'a>(base: &'a AnalysisResult, current: &'a AnalysisResult) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    base.entities()
        .chain(current.entities())
        .map(|e| e.name.as_str())
        .filter(|name| seen.insert(*name))
        .collect()
}
