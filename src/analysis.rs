use crate::category::{categorize, CategoryConfig, Tier};
use crate::ingestion::PerformanceRow;
use crate::metrics::{aggregate, AggregatedMetrics};
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EntityMetrics {
    pub name: String,
    pub metrics: AggregatedMetrics,
}

/// One tier's subtotal and its entities, most expensive first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CategoryResult {
    pub tier: Tier,
    pub metrics: AggregatedMetrics,
    pub entities: Vec<EntityMetrics>,
}

impl CategoryResult {
    pub fn empty(tier: Tier) -> Self {
        Self {
            tier,
            metrics: AggregatedMetrics::default(),
            entities: Vec::new(),
        }
    }

    pub fn entity(&self, name: &str) -> Option<&AggregatedMetrics> {
        self.entities
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.metrics)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub global: AggregatedMetrics,
    pub by_tier: BTreeMap<Tier, CategoryResult>,
}

impl AnalysisResult {
    /// Always `Some` for results produced by [`analyze`]; a deserialized
    /// result may be missing tiers.
    pub fn tier(&self, tier: Tier) -> Option<&CategoryResult> {
        self.by_tier.get(&tier)
    }

    /// Every entity across all tiers, in tier priority order.
    pub fn entities(&self) -> impl Iterator<Item = &EntityMetrics> {
        self.by_tier.values().flat_map(|category| category.entities.iter())
    }

    pub fn entity_count(&self) -> usize {
        self.by_tier.values().map(|c| c.entities.len()).sum()
    }
}

/// Global totals, then per-tier subtotals, then per-entity figures. Tier and
/// entity shares are all relative to the global totals.
pub fn analyze(rows: &[PerformanceRow], config: &CategoryConfig) -> AnalysisResult {
    let global = aggregate(rows, None);

    let mut groups: BTreeMap<Tier, Vec<&PerformanceRow>> =
        Tier::ALL.iter().map(|tier| (*tier, Vec::new())).collect();
    for row in rows {
        groups
            .entry(categorize(&row.entity, config))
            .or_default()
            .push(row);
    }

    let by_tier: BTreeMap<Tier, CategoryResult> = groups
        .into_iter()
        .map(|(tier, tier_rows)| {
            let metrics = aggregate(tier_rows.iter().copied(), Some(&global));
            let entities = entity_breakdown(&tier_rows, &global);
            (tier, CategoryResult { tier, metrics, entities })
        })
        .collect();

    debug!(
        "Analyzed {} rows: {} entities across {} tiers",
        rows.len(),
        by_tier.values().map(|c| c.entities.len()).sum::<usize>(),
        by_tier.len()
    );

    AnalysisResult { global, by_tier }
}

fn entity_breakdown(rows: &[&PerformanceRow], global: &AggregatedMetrics) -> Vec<EntityMetrics> {
    let mut order: Vec<(&str, Vec<&PerformanceRow>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for &row in rows {
        let slot = *index.entry(row.entity.as_str()).or_insert_with(|| {
            order.push((row.entity.as_str(), Vec::new()));
            order.len() - 1
        });
        order[slot].1.push(row);
    }

    let mut entities: Vec<EntityMetrics> = order
        .into_iter()
        .map(|(name, entity_rows)| EntityMetrics {
            name: name.to_string(),
            metrics: aggregate(entity_rows, Some(global)),
        })
        .collect();

    // Stable: equal costs keep first-encounter order.
    entities.sort_by(|a, b| b.metrics.total_cost.total_cmp(&a.metrics.total_cost));
    entities
}
