//! Size-bounded snapshot persistence.
//!
//! A snapshot keeps the current generation and the one it replaced. When the
//! serialized document would exceed the store ceiling, the previous
//! generation's items are dropped (its metadata stays); the current generation
//! is never truncated.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;
use crate::models::Item;
use crate::store::BlobStore;

/// Default per-document ceiling, 1 MiB
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationMeta {
    pub count: usize,
    pub description: String,
    /// Set when the items were dropped to fit the size ceiling
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub items_dropped: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    pub items: Vec<Item>,
    /// UTC date, `YYYY-MM-DD`
    pub date: String,
    pub generated_at: DateTime<Utc>,
    pub meta: GenerationMeta,
}

impl Generation {
    pub fn new(items: Vec<Item>, generated_at: DateTime<Utc>, description: impl Into<String>) -> Self {
        let meta = GenerationMeta {
            count: items.len(),
            description: description.into(),
            items_dropped: false,
        };
        Self {
            items,
            date: generated_at.format("%Y-%m-%d").to_string(),
            generated_at,
            meta,
        }
    }

    fn drop_items(&mut self) {
        self.items.clear();
        self.meta.items_dropped = true;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub current: Generation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<Generation>,
}

impl Snapshot {
    pub fn first(current: Generation) -> Self {
        Self {
            current,
            previous: None,
        }
    }

    /// `next` becomes current; the current generation becomes previous.
    pub fn advance(self, next: Generation) -> Self {
        Self {
            current: next,
            previous: Some(self.current),
        }
    }

    /// Items of the previous generation, empty if none or dropped.
    pub fn previous_items(&self) -> &[Item] {
        self.previous
            .as_ref()
            .map(|generation| generation.items.as_slice())
            .unwrap_or_default()
    }
}

pub struct SnapshotStore {
    store: Arc<dyn BlobStore>,
    max_bytes: usize,
}

impl SnapshotStore {
    pub fn new(store: Arc<dyn BlobStore>, max_bytes: usize) -> Self {
        Self { store, max_bytes }
    }

    /// `Ok(None)` on first run. Transport errors and unreadable documents propagate.
    pub async fn load(&self, key: &str) -> Result<Option<Snapshot>, SnapshotError> {
        let Some(bytes) = self.store.read(key).await? else {
            tracing::debug!("No snapshot stored under {}", key);
            return Ok(None);
        };

        if bytes.len() > self.max_bytes {
            return Err(SnapshotError::TooLarge {
                size: bytes.len(),
                limit: self.max_bytes,
            });
        }

        let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
        Ok(Some(snapshot))
    }

    /// Persist `snapshot`, returning what was actually written.
    pub async fn save(&self, key: &str, mut snapshot: Snapshot) -> Result<Snapshot, SnapshotError> {
        let mut bytes = serde_json::to_vec(&snapshot)?;

        if bytes.len() > self.max_bytes {
            let Some(previous) = snapshot.previous.as_mut().filter(|p| !p.items.is_empty()) else {
                return Err(self.too_large(key, bytes.len()));
            };

            tracing::warn!(
                "Snapshot {} is {} bytes (limit {}), dropping {} previous items",
                key,
                bytes.len(),
                self.max_bytes,
                previous.items.len()
            );
            previous.drop_items();
            bytes = serde_json::to_vec(&snapshot)?;

            if bytes.len() > self.max_bytes {
                return Err(self.too_large(key, bytes.len()));
            }
        }

        self.store.write(key, Some(bytes)).await?;
        tracing::info!(
            "Saved snapshot {} ({} items)",
            key,
            snapshot.current.meta.count
        );
        Ok(snapshot)
    }

    fn too_large(&self, key: &str, size: usize) -> SnapshotError {
        tracing::error!(
            "Snapshot {} is {} bytes, over the {} byte limit",
            key,
            size,
            self.max_bytes
        );
        SnapshotError::TooLarge {
            size,
            limit: self.max_bytes,
        }
    }
}
