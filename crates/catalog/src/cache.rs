//! In-process result cache with a fixed TTL.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

use crate::models::Item;

pub const DEFAULT_CACHE_TTL_SECS: i64 = 300;

/// Cache of served lists, keyed by snapshot key.
///
/// Async so a shared cache across processes can stand in for the in-memory one.
#[async_trait]
pub trait ResultCache: Send + Sync {
    async fn get(&self, key: &str, now: DateTime<Utc>) -> Option<Vec<Item>>;

    async fn put(&self, key: &str, items: Vec<Item>, now: DateTime<Utc>);

    async fn invalidate(&self, key: &str);
}

struct Entry {
    items: Vec<Item>,
    stored_at: DateTime<Utc>,
}

pub struct MemoryResultCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, Entry>>,
}

impl Default for MemoryResultCache {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_CACHE_TTL_SECS))
    }
}

impl MemoryResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ResultCache for MemoryResultCache {
    async fn get(&self, key: &str, now: DateTime<Utc>) -> Option<Vec<Item>> {
        {
            let entries = self.entries.read();
            let entry = entries.get(key)?;
            if now - entry.stored_at < self.ttl {
                return Some(entry.items.clone());
            }
        }

        // expired
        self.entries.write().remove(key);
        None
    }

    async fn put(&self, key: &str, items: Vec<Item>, now: DateTime<Utc>) {
        self.entries.write().insert(
            key.to_string(),
            Entry {
                items,
                stored_at: now,
            },
        );
    }

    async fn invalidate(&self, key: &str) {
        self.entries.write().remove(key);
    }
}
