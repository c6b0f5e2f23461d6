use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One spreadsheet row keyed by its header text, in column order.
pub type RawRecord = Map<String, Value>;

/// Finds the value of the first header matching one of `candidates`.
///
/// Pass one compares trimmed headers exactly, candidate by candidate. Pass two
/// accepts a header that contains the candidate case-insensitively and none of
/// the `exclusions`, so "Click Rate" never stands in for "Click".
pub fn resolve<'a, C, E>(record: &'a RawRecord, candidates: &[C], exclusions: &[E]) -> Option<&'a Value>
where
    C: AsRef<str>,
    E: AsRef<str>,
{
    for candidate in candidates {
        let candidate = candidate.as_ref();
        if let Some((_, value)) = record.iter().find(|(key, _)| key.trim() == candidate) {
            return Some(value);
        }
    }

    let exclusions: Vec<String> = exclusions.iter().map(|e| e.as_ref().to_lowercase()).collect();

    for candidate in candidates {
        let needle = candidate.as_ref().to_lowercase();
        let found = record.iter().find(|(key, _)| {
            let key = key.to_lowercase();
            key.contains(&needle) && !exclusions.iter().any(|ex| key.contains(ex.as_str()))
        });
        if let Some((_, value)) = found {
            return Some(value);
        }
    }

    None
}

/// Ordered header candidates plus exclusion tokens for one canonical field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ColumnSpec {
    pub candidates: Vec<String>,
    #[serde(default)]
    pub exclusions: Vec<String>,
}

impl ColumnSpec {
    pub fn new(candidates: &[&str], exclusions: &[&str]) -> Self {
        Self {
            candidates: candidates.iter().map(|s| s.to_string()).collect(),
            exclusions: exclusions.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn resolve<'a>(&self, record: &'a RawRecord) -> Option<&'a Value> {
        resolve(record, &self.candidates, &self.exclusions)
    }
}

/// Header vocabulary used by ingestion.
///
/// The default recognizes the Chinese and English headers found in ad-platform
/// exports. Deserialize a custom catalog to support other layouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnCatalog {
    pub entity: ColumnSpec,
    pub cost: ColumnSpec,
    pub impressions: ColumnSpec,
    pub clicks: ColumnSpec,
    pub source_click_cost: ColumnSpec,
    pub leads: ColumnSpec,
    pub qualified_click_ratio: ColumnSpec,
    pub qualified_click_count: ColumnSpec,
    pub period: ColumnSpec,
}

impl Default for ColumnCatalog {
    fn default() -> Self {
        Self {
            entity: ColumnSpec::new(&["国家/地区", "国家", "Country", "Region"], &[]),
            cost: ColumnSpec::new(&["花费", "Cost", "Spend", "金额"], &[]),
            impressions: ColumnSpec::new(&["曝光量", "曝光", "Impressions"], &[]),
            clicks: ColumnSpec::new(
                &["点击量", "Clicks", "Click"],
                &["率", "Rate", "占比", "Ratio", "成本", "Cost"],
            ),
            source_click_cost: ColumnSpec::new(&["点击成本", "CPC", "Click Cost"], &[]),
            leads: ColumnSpec::new(
                &["商机量", "Leads", "Lead", "Opportunit", "询盘"],
                &["率", "Rate", "成本", "Cost"],
            ),
            qualified_click_ratio: ColumnSpec::new(
                &["L1+买家点击占比", "L1+点击占比", "L1+ Click Ratio", "L1+ Ratio"],
                &[],
            ),
            qualified_click_count: ColumnSpec::new(&["L1+点击量", "L1+ Count", "L1+ Clicks"], &[]),
            period: ColumnSpec::new(&["日期", "Date", "Time", "Period", "时间"], &[]),
        }
    }
}
