use crate::analysis::AnalysisResult;
use crate::category::CategoryConfig;
use crate::error::{MonitorError, Result};
use chrono::{DateTime, Utc};
use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Retained snapshots per store; saving past this evicts the oldest.
pub const MAX_SNAPSHOTS: usize = 50;

/// A saved analysis together with the tier config that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistorySnapshot {
    #[schemars(description = "Creation time in milliseconds since the Unix epoch, as text")]
    pub id: String,
    #[schemars(description = "User-facing label, usually the source file name")]
    pub label: String,
    pub saved_at: DateTime<Utc>,
    pub analysis: AnalysisResult,
    pub config: CategoryConfig,
}

impl HistorySnapshot {
    pub fn new(label: impl Into<String>, analysis: AnalysisResult, config: CategoryConfig) -> Self {
        Self::at(Utc::now(), label, analysis, config)
    }

    pub fn at(
        saved_at: DateTime<Utc>,
        label: impl Into<String>,
        analysis: AnalysisResult,
        config: CategoryConfig,
    ) -> Self {
        Self {
            id: saved_at.timestamp_millis().to_string(),
            label: label.into(),
            saved_at,
            analysis,
            config,
        }
    }
}

/// Persistence for saved snapshots, newest first.
pub trait SnapshotStore {
    fn list(&self) -> Result<Vec<HistorySnapshot>>;

    /// Prepends `snapshot` and returns the updated list, capped at
    /// [`MAX_SNAPSHOTS`].
    fn save(&mut self, snapshot: HistorySnapshot) -> Result<Vec<HistorySnapshot>>;

    fn delete(&mut self, id: &str) -> Result<Vec<HistorySnapshot>>;

    fn get(&self, id: &str) -> Result<HistorySnapshot> {
        self.list()?
            .into_iter()
            .find(|s| s.id == id)
            .ok_or_else(|| MonitorError::SnapshotNotFound(id.to_string()))
    }
}

fn push_capped(history: &mut Vec<HistorySnapshot>, snapshot: HistorySnapshot) {
    history.insert(0, snapshot);
    if history.len() > MAX_SNAPSHOTS {
        debug!("Evicting {} oldest snapshots", history.len() - MAX_SNAPSHOTS);
        history.truncate(MAX_SNAPSHOTS);
    }
}

fn remove_by_id(history: &mut Vec<HistorySnapshot>, id: &str) -> Result<()> {
    let before = history.len();
    history.retain(|s| s.id != id);
    if history.len() == before {
        return Err(MonitorError::SnapshotNotFound(id.to_string()));
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    history: Vec<HistorySnapshot>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn list(&self) -> Result<Vec<HistorySnapshot>> {
        Ok(self.history.clone())
    }

    fn save(&mut self, snapshot: HistorySnapshot) -> Result<Vec<HistorySnapshot>> {
        push_capped(&mut self.history, snapshot);
        Ok(self.history.clone())
    }

    fn delete(&mut self, id: &str) -> Result<Vec<HistorySnapshot>> {
        remove_by_id(&mut self.history, id)?;
        Ok(self.history.clone())
    }
}

/// Keeps the whole history as one JSON array file.
#[derive(Debug, Clone)]
pub struct JsonFileSnapshotStore {
    path: PathBuf,
}

impl JsonFileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, history: &[HistorySnapshot]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(history)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl SnapshotStore for JsonFileSnapshotStore {
    fn list(&self) -> Result<Vec<HistorySnapshot>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&mut self, snapshot: HistorySnapshot) -> Result<Vec<HistorySnapshot>> {
        let mut history = self.list()?;
        info!("Saving snapshot '{}' ({})", snapshot.label, snapshot.id);
        push_capped(&mut history, snapshot);
        self.write(&history)?;
        Ok(history)
    }

    fn delete(&mut self, id: &str) -> Result<Vec<HistorySnapshot>> {
        let mut history = self.list()?;
        remove_by_id(&mut history, id)?;
        self.write(&history)?;
        info!("Deleted snapshot {}", id);
        Ok(history)
    }
}
