//! Durable key/value blob storage for snapshot documents.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::StoreError;

/// A key/value store holding one document per key.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Returns `Ok(None)` when no document exists under `key`.
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Stores `bytes` under `key`; `None` deletes the document.
    async fn write(&self, key: &str, bytes: Option<Vec<u8>>) -> Result<(), StoreError>;
}

fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

/// Stores each document as `<root>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    root: Option<PathBuf>,
}

impl FileBlobStore {
    /// A store without a root fails every call with [`StoreError::NotConfigured`].
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    fn path(&self, key: &str) -> Result<PathBuf, StoreError> {
        let root = self.root.as_deref().ok_or(StoreError::NotConfigured)?;
        validate_key(key)?;
        Ok(root.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, key: &str, bytes: Option<Vec<u8>>) -> Result<(), StoreError> {
        let path = self.path(key)?;
        match bytes {
            Some(bytes) => write_atomic(&path, &bytes).await,
            None => match tokio::fs::remove_file(&path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            },
        }
    }
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, bytes).await?;
    tokio::fs::rename(&tmp_path, path).await?;

    tracing::debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// In-process store, for tests and single-run tools.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    documents: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        validate_key(key)?;
        Ok(self.documents.read().get(key).cloned())
    }

    async fn write(&self, key: &str, bytes: Option<Vec<u8>>) -> Result<(), StoreError> {
        validate_key(key)?;
        let mut documents = self.documents.write();
        match bytes {
            Some(bytes) => {
                documents.insert(key.to_string(), bytes);
            }
            None => {
                documents.remove(key);
            }
        }
        Ok(())
    }
}
