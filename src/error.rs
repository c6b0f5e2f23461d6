use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Ingestion failed: {0}")]
    IngestionFailed(String),

    #[error("No recognizable performance data found in input")]
    NoRecognizableData,

    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
