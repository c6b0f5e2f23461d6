use crate::ingestion::PerformanceRow;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Summary statistics for one set of rows.
///
/// Shares are percentages of the parent set passed to [`aggregate`]; a set
/// aggregated without a parent reports 100 for every non-zero total.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedMetrics {
    pub total_cost: f64,
    pub total_impressions: f64,
    pub total_clicks: f64,
    pub total_leads: f64,
    #[schemars(description = "Clicks-weighted average of the qualified click ratio (0-1)")]
    pub qualified_click_ratio: f64,
    #[schemars(description = "Clicks-weighted average of the reported cost per click")]
    pub source_click_cost: f64,
    #[schemars(
        description = "Cost per lead. 0 when there are no leads, which consumers should read as undefined if cost > 0"
    )]
    pub promotion_cost: f64,
    pub cost_share: f64,
    pub impression_share: f64,
    pub click_share: f64,
    pub lead_share: f64,
}

impl AggregatedMetrics {
    /// Cost per lead, or `None` when there were no leads to divide by.
    pub fn promotion_cost_if_defined(&self) -> Option<f64> {
        (self.total_leads > 0.0).then_some(self.promotion_cost)
    }

    pub fn is_empty(&self) -> bool {
        self.total_cost == 0.0
            && self.total_impressions == 0.0
            && self.total_clicks == 0.0
            && self.total_leads == 0.0
    }
}

#[derive(Default)]
struct Accumulator {
    rows: usize,
    cost: f64,
    impressions: f64,
    clicks: f64,
    leads: f64,
    weighted_ratio: f64,
    weighted_click_cost: f64,
    click_cost_sum: f64,
}

impl Accumulator {
    fn add(&mut self, row: &PerformanceRow) {
        self.rows += 1;
        self.cost += row.cost;
        self.impressions += row.impressions;
        self.clicks += row.clicks;
        self.leads += row.leads;
        self.weighted_ratio += row.qualified_click_ratio * row.clicks;
        self.weighted_click_cost += row.source_click_cost * row.clicks;
        self.click_cost_sum += row.source_click_cost;
    }
}

/// Aggregates `rows`, computing shares against `parent` when given.
pub fn aggregate<'a, I>(rows: I, parent: Option<&AggregatedMetrics>) -> AggregatedMetrics
where
    I: IntoIterator<Item = &'a PerformanceRow>,
{
    let mut acc = Accumulator::default();
    for row in rows {
        acc.add(row);
    }

    let qualified_click_ratio = if acc.clicks > 0.0 {
        acc.weighted_ratio / acc.clicks
    } else {
        0.0
    };

    // Zero-click sets still carry a reported CPC worth showing.
    let source_click_cost = if acc.clicks > 0.0 {
        acc.weighted_click_cost / acc.clicks
    } else if acc.rows > 0 {
        acc.click_cost_sum / acc.rows as f64
    } else {
        0.0
    };

    let promotion_cost = if acc.leads > 0.0 { acc.cost / acc.leads } else { 0.0 };

    AggregatedMetrics {
        total_cost: acc.cost,
        total_impressions: acc.impressions,
        total_clicks: acc.clicks,
        total_leads: acc.leads,
        qualified_click_ratio,
        source_click_cost,
        promotion_cost,
        cost_share: share(acc.cost, parent.map(|p| p.total_cost)),
        impression_share: share(acc.impressions, parent.map(|p| p.total_impressions)),
        click_share: share(acc.clicks, parent.map(|p| p.total_clicks)),
        lead_share: share(acc.leads, parent.map(|p| p.total_leads)),
    }
}

fn share(own: f64, parent_total: Option<f64>) -> f64 {
    match parent_total {
        Some(total) if total > 0.0 => own / total * 100.0,
        _ if own > 0.0 => 100.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(entity: &str, cost: f64, clicks: f64, leads: f64) -> PerformanceRow {
        PerformanceRow {
            entity: entity.to_string(),
            cost,
            impressions: clicks * 10.0,
            clicks,
            leads,
            qualified_click_ratio: 0.0,
            source_click_cost: 0.0,
            period: None,
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_empty_set_is_all_zero() {
        let metrics = aggregate(std::iter::empty(), None);
        assert_eq!(metrics, AggregatedMetrics::default());
        assert!(metrics.is_empty());
    }

    #[test]
    fn test_weighted_averages_use_clicks() {
        let mut a = row("US", 100.0, 30.0, 2.0);
        a.qualified_click_ratio = 0.5;
        a.source_click_cost = 3.0;
        let mut b = row("US", 50.0, 10.0, 0.0);
        b.qualified_click_ratio = 0.1;
        b.source_click_cost = 1.0;

        let metrics = aggregate(&[a, b], None);
        assert!(approx(metrics.qualified_click_ratio, (0.5 * 30.0 + 0.1 * 10.0) / 40.0));
        assert!(approx(metrics.source_click_cost, (3.0 * 30.0 + 1.0 * 10.0) / 40.0));
        assert!(approx(metrics.promotion_cost, 75.0));
    }

    #[test]
    fn test_zero_clicks_falls_back_to_mean_click_cost() {
        let mut a = row("US", 10.0, 0.0, 0.0);
        a.source_click_cost = 2.0;
        a.qualified_click_ratio = 0.9;
        let mut b = row("US", 10.0, 0.0, 0.0);
        b.source_click_cost = 4.0;

        let metrics = aggregate(&[a, b], None);
        assert!(approx(metrics.source_click_cost, 3.0));
        assert_eq!(metrics.qualified_click_ratio, 0.0);
    }

    #[test]
    fn test_promotion_cost_zero_without_leads() {
        let metrics = aggregate(&[row("US", 500.0, 10.0, 0.0)], None);
        assert_eq!(metrics.promotion_cost, 0.0);
        assert_eq!(metrics.promotion_cost_if_defined(), None);
    }

    #[test]
    fn test_shares_against_parent() {
        let rows = vec![row("US", 75.0, 30.0, 1.0), row("FR", 25.0, 10.0, 3.0)];
        let global = aggregate(&rows, None);
        assert_eq!(global.cost_share, 100.0);
        assert_eq!(global.lead_share, 100.0);

        let us = aggregate(&rows[..1], Some(&global));
        assert!(approx(us.cost_share, 75.0));
        assert!(approx(us.click_share, 75.0));
        assert!(approx(us.lead_share, 25.0));
    }

    #[test]
    fn test_zero_parent_total_gives_zero_share() {
        let rows = vec![row("US", 0.0, 0.0, 0.0)];
        let global = aggregate(&rows, None);
        let us = aggregate(&rows, Some(&global));
        assert_eq!(us.cost_share, 0.0);
        assert_eq!(global.cost_share, 0.0);
    }
}
