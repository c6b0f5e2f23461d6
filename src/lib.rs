//! # Ad Performance Monitor
//!
//! A library for turning advertising-performance spreadsheet exports into
//! tiered, weighted metrics.
//!
//! ## Core Concepts
//!
//! - **Raw records**: one row per entity (usually a country) per period, keyed
//!   by whatever headers the export used, in Chinese or English
//! - **Column resolution**: exact header match first, then a case-insensitive
//!   substring match that skips headers containing exclusion tokens
//! - **Tiers**: entities are classified into tier1/tier2/tier3 by a
//!   [`CategoryConfig`]; everything else is `Uncategorized`
//! - **Metrics**: totals, clicks-weighted ratios, cost per lead, and shares of
//!   the global totals, at global, tier, and entity level
//! - **Trends and comparisons**: per-period tier sums, and entity-level deltas
//!   between a saved snapshot and a fresh analysis
//!
//! ## Example
//!
//! ```rust,ignore
//! use ad_performance_monitor::*;
//!
//! let records = read_csv_records(std::fs::File::open("march.csv")?)?;
//! let config = CategoryConfig::bilingual_default();
//!
//! let report = process_performance_data(&records, &config)?;
//! println!("Cost per lead: {:.2}", report.analysis.global.promotion_cost);
//!
//! let mut store = JsonFileSnapshotStore::new("history.json");
//! store.save(HistorySnapshot::new("march.csv", report.analysis.clone(), config.clone()))?;
//! ```

pub mod analysis;
pub mod category;
pub mod columns;
pub mod comparison;
pub mod error;
pub mod ingestion;
pub mod metrics;
pub mod normalize;
pub mod period;
pub mod schema;
pub mod snapshot;
pub mod trend;

pub use analysis::{analyze, AnalysisResult, CategoryResult, EntityMetrics};
pub use category::{categorize, detected_entities, parse_name_list, CategoryConfig, Tier};
pub use columns::{resolve, ColumnCatalog, ColumnSpec, RawRecord};
pub use comparison::{compare, ComparisonReport, DeltaDirection, EntityComparison, UNCHANGED_THRESHOLD};
pub use error::{MonitorError, Result};
pub use ingestion::*;
pub use metrics::{aggregate, AggregatedMetrics};
pub use normalize::{normalize, parse_clean_number};
pub use snapshot::{
    HistorySnapshot, JsonFileSnapshotStore, MemorySnapshotStore, SnapshotStore, MAX_SNAPSHOTS,
};
pub use trend::{generate_trend, TierTotals, TrendPoint};

use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Everything derived from one ingested table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedReport {
    pub rows: Vec<PerformanceRow>,
    pub analysis: AnalysisResult,
    /// `None` when the table had no period column.
    pub trend: Option<Vec<TrendPoint>>,
}

pub struct PerformanceProcessor;

impl PerformanceProcessor {
    pub fn process(records: &[RawRecord], config: &CategoryConfig) -> Result<ProcessedReport> {
        Self::process_with_catalog(records, config, &ColumnCatalog::default())
    }

    pub fn process_with_catalog(
        records: &[RawRecord],
        config: &CategoryConfig,
        catalog: &ColumnCatalog,
    ) -> Result<ProcessedReport> {
        let rows = ingest_with_catalog(records, catalog);

        if !has_recognizable_data(&rows) {
            return Err(MonitorError::NoRecognizableData);
        }

        let report = Self::recompute(rows, config);

        info!(
            "Processed {} rows into {} entities (total cost {:.2}, leads {})",
            report.rows.len(),
            report.analysis.entity_count(),
            report.analysis.global.total_cost,
            report.analysis.global.total_leads
        );

        Ok(report)
    }

    /// Re-derives analysis and trend for `rows`, typically after the tier
    /// config was edited. Nothing from earlier runs is reused.
    pub fn recompute(rows: Vec<PerformanceRow>, config: &CategoryConfig) -> ProcessedReport {
        debug!(
            "Recomputing analysis for {} rows with {} tier rules",
            rows.len(),
            config.rule_count()
        );

        let analysis = analyze(&rows, config);
        let trend = generate_trend(&rows, config);

        ProcessedReport {
            rows,
            analysis,
            trend,
        }
    }
}

pub fn process_performance_data(
    records: &[RawRecord],
    config: &CategoryConfig,
) -> Result<ProcessedReport> {
    PerformanceProcessor::process(records, config)
}

/// Compares a saved snapshot (the base) with a fresh analysis, grouped under
/// the config in effect now.
pub fn compare_snapshots(
    base: &HistorySnapshot,
    current: &AnalysisResult,
    config: &CategoryConfig,
) -> ComparisonReport {
    compare(&base.analysis, current, config)
}
