use metadata::ProviderError;
use thiserror::Error;

/// Blob storage failure
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Snapshot store is not configured")]
    NotConfigured,

    #[error("Invalid snapshot key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Snapshot of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Catalog fetch failed: {0}")]
    Catalog(#[from] ProviderError),

    #[error("Snapshot error: {0}")]
    Snapshot(SnapshotError),

    #[error("Refresh of {0} produced no items")]
    EmptyRefresh(String),
}

impl From<StoreError> for OrchestratorError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotConfigured => OrchestratorError::Config(e.to_string()),
            other => OrchestratorError::Snapshot(SnapshotError::Store(other)),
        }
    }
}

impl From<SnapshotError> for OrchestratorError {
    fn from(e: SnapshotError) -> Self {
        match e {
            SnapshotError::Store(store) => store.into(),
            other => OrchestratorError::Snapshot(other),
        }
    }
}
