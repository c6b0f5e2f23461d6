use crate::analysis::AnalysisResult;
use crate::category::CategoryConfig;
use crate::snapshot::HistorySnapshot;

pub fn analysis_schema() -> schemars::schema::RootSchema {
    schemars::schema_for!(AnalysisResult)
}

pub fn analysis_schema_json() -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&analysis_schema())
}

pub fn snapshot_schema_json() -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&schemars::schema_for!(HistorySnapshot))
}

pub fn category_config_schema_json() -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&schemars::schema_for!(CategoryConfig))
}
