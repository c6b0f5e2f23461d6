use crate::columns::{ColumnCatalog, RawRecord};
use crate::error::{MonitorError, Result};
use crate::normalize::{normalize, normalize_opt};
use log::{debug, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::io::Read;

pub const UNKNOWN_ENTITY: &str = "Unknown";

/// One entity-period observation after header resolution and number cleanup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceRow {
    pub entity: String,
    pub cost: f64,
    pub impressions: f64,
    pub clicks: f64,
    pub leads: f64,
    /// Share of clicks from qualified (L1+) buyers, in `[0, 1]`.
    pub qualified_click_ratio: f64,
    /// Cost per click as reported by the source, never recomputed.
    pub source_click_cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
}

impl PerformanceRow {
    pub fn is_all_zero(&self) -> bool {
        self.cost == 0.0
            && self.impressions == 0.0
            && self.clicks == 0.0
            && self.leads == 0.0
            && self.qualified_click_ratio == 0.0
            && self.source_click_cost == 0.0
    }
}

pub fn ingest(records: &[RawRecord]) -> Vec<PerformanceRow> {
    ingest_with_catalog(records, &ColumnCatalog::default())
}

pub fn ingest_with_catalog(records: &[RawRecord], catalog: &ColumnCatalog) -> Vec<PerformanceRow> {
    let rows: Vec<PerformanceRow> = records
        .iter()
        .map(|record| ingest_record(record, catalog))
        .collect();

    debug!("Ingested {} rows from {} raw records", rows.len(), records.len());
    rows
}

/// Every field degrades to its zero/default value independently; a record
/// with no recognizable headers still yields a row.
pub fn ingest_record(record: &RawRecord, catalog: &ColumnCatalog) -> PerformanceRow {
    let cost = normalize_opt(catalog.cost.resolve(record));
    let impressions = normalize_opt(catalog.impressions.resolve(record));
    let clicks = normalize_opt(catalog.clicks.resolve(record));
    let source_click_cost = normalize_opt(catalog.source_click_cost.resolve(record));
    let leads = normalize_opt(catalog.leads.resolve(record));

    let mut qualified_click_ratio = match present(catalog.qualified_click_ratio.resolve(record)) {
        Some(raw) => normalize(raw),
        None => {
            let count = normalize_opt(catalog.qualified_click_count.resolve(record));
            if clicks > 0.0 {
                count / clicks
            } else {
                0.0
            }
        }
    };

    // Heuristic: a bare "20" in a ratio column means 20%.
    if qualified_click_ratio > 1.0 {
        qualified_click_ratio /= 100.0;
    }

    let entity = present(catalog.entity.resolve(record))
        .and_then(cell_text)
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| UNKNOWN_ENTITY.to_string());

    let period = present(catalog.period.resolve(record))
        .and_then(cell_text)
        .filter(|p| !p.is_empty());

    PerformanceRow {
        entity,
        cost,
        impressions,
        clicks,
        leads,
        qualified_click_ratio,
        source_click_cost,
        period,
    }
}

/// False when no row carries any non-zero figure; callers report this as
/// "file had no recognizable data".
pub fn has_recognizable_data(rows: &[PerformanceRow]) -> bool {
    rows.iter().any(|row| !row.is_all_zero())
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Reads a header-first CSV table into raw records. Empty cells are left out
/// of the record, as spreadsheet exporters do.
///
/// Cells that are not valid UTF-8 are decoded lossily and malformed rows are
/// skipped. Only an unreadable header row or a failing reader is an
/// `IngestionFailed`.
pub fn read_csv_records<R: Read>(reader: R) -> Result<Vec<RawRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::None)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .byte_headers()
        .map_err(|e| MonitorError::IngestionFailed(format!("Unreadable header row: {}", e)))?
        .iter()
        .map(|h| String::from_utf8_lossy(h).into_owned())
        .collect();

    let mut records = Vec::new();
    for (idx, result) in csv_reader.byte_records().enumerate() {
        let line = match result {
            Ok(line) => line,
            Err(e) if e.is_io_error() => {
                return Err(MonitorError::IngestionFailed(format!(
                    "Unreadable table row #{}: {}",
                    idx + 1,
                    e
                )));
            }
            Err(e) => {
                warn!("Skipping malformed table row #{}: {}", idx + 1, e);
                continue;
            }
        };

        let mut record = RawRecord::new();
        for (header, cell) in headers.iter().zip(line.iter()) {
            if header.is_empty() || cell.is_empty() {
                continue;
            }
            let text = String::from_utf8_lossy(cell);
            if matches!(text, Cow::Owned(_)) {
                warn!("Row #{} column '{}' is not valid UTF-8; decoded lossily", idx + 1, header);
            }
            record.insert(header.clone(), Value::String(text.into_owned()));
        }
        records.push(record);
    }

    debug!("Read {} records with {} columns from CSV", records.len(), headers.len());
    Ok(records)
}

/// Reads a JSON array of objects (one object per row).
pub fn read_json_records<R: Read>(reader: R) -> Result<Vec<RawRecord>> {
    let value: Value = serde_json::from_reader(reader)
        .map_err(|e| MonitorError::IngestionFailed(format!("Input is not valid JSON: {}", e)))?;

    let Value::Array(items) = value else {
        return Err(MonitorError::IngestionFailed(
            "Expected a JSON array of row objects".to_string(),
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| match item {
            Value::Object(record) => Ok(record),
            other => Err(MonitorError::IngestionFailed(format!(
                "Row #{} is not an object: {}",
                idx + 1,
                other
            ))),
        })
        .collect()
}
