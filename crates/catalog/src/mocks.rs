//! Mock collaborators for testing the enrichment engine.
//!
//! Providers answer from scripted responses and record every call, so tests
//! can assert on how many lookups a pass issued.
//!
//! # Example
//!
//! ```ignore
//! let reference = Arc::new(MockLookupProvider::new("tmdb"));
//! reference.on_search("Frieren", Ok(vec![hit]));
//!
//! pipeline.run(&mut items, now).await;
//! assert_eq!(reference.calls_to("search"), 1);
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use metadata::{
    CatalogEntry, CatalogSource, Details, ExternalIds, ListRequest, LookupProvider, MediaType,
    ProviderError, ProviderId, SearchHit,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::clock::Clock;
use crate::models::{Item, Titles};

/// Item with only a localized catalog title.
pub fn item_with_title(source_id: &str, title: &str) -> Item {
    Item::new(
        source_id,
        Titles {
            localized: Some(title.to_string()),
            native: None,
            romanized: None,
        },
    )
}

/// Catalog entry with only a localized title.
pub fn entry(source_id: &str, title: &str) -> CatalogEntry {
    CatalogEntry {
        source_id: source_id.to_string(),
        title_localized: Some(title.to_string()),
        title_native: None,
        title_romanized: None,
        media_type: MediaType::Tv,
        air_date: None,
        image_url: None,
    }
}

type Scripted<T> = Result<T, String>;

fn replay<T: Clone>(scripted: Option<&Scripted<T>>, default: T) -> Result<T, ProviderError> {
    match scripted {
        Some(Ok(value)) => Ok(value.clone()),
        Some(Err(message)) => Err(ProviderError::Other(message.clone())),
        None => Ok(default),
    }
}

// ============================================================================
// Mock Lookup Provider
// ============================================================================

/// Unscripted lookups answer "nothing found".
#[derive(Default)]
struct Script {
    searches: HashMap<String, Scripted<Vec<SearchHit>>>,
    details: HashMap<ProviderId, Scripted<Option<Details>>>,
    external_ids: HashMap<ProviderId, Scripted<Option<ExternalIds>>>,
    series: HashMap<i64, Scripted<Option<Details>>>,
}

pub struct MockLookupProvider {
    name: &'static str,
    script: Arc<Mutex<Script>>,
    calls: Arc<Mutex<Vec<&'static str>>>,
}

impl MockLookupProvider {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            script: Arc::default(),
            calls: Arc::default(),
        }
    }

    pub fn on_search(&self, title: &str, result: Scripted<Vec<SearchHit>>) {
        self.script
            .lock()
            .unwrap()
            .searches
            .insert(title.to_string(), result);
    }

    pub fn on_details(&self, id: ProviderId, result: Scripted<Option<Details>>) {
        self.script.lock().unwrap().details.insert(id, result);
    }

    pub fn on_external_ids(&self, id: ProviderId, result: Scripted<Option<ExternalIds>>) {
        self.script.lock().unwrap().external_ids.insert(id, result);
    }

    pub fn on_series(&self, id: i64, result: Scripted<Option<Details>>) {
        self.script.lock().unwrap().series.insert(id, result);
    }

    /// Number of calls to one method: `search`, `details`, `external_ids` or `series`.
    pub fn calls_to(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| **call == method)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, method: &'static str) {
        self.calls.lock().unwrap().push(method);
    }
}

#[async_trait]
impl LookupProvider for MockLookupProvider {
    async fn search_by_title(
        &self,
        title: &str,
        _language: &str,
    ) -> Result<Vec<SearchHit>, ProviderError> {
        self.record("search");
        replay(self.script.lock().unwrap().searches.get(title), Vec::new())
    }

    async fn get_details(
        &self,
        id: ProviderId,
        _language: &str,
    ) -> Result<Option<Details>, ProviderError> {
        self.record("details");
        replay(self.script.lock().unwrap().details.get(&id), None)
    }

    async fn get_external_ids(&self, id: ProviderId) -> Result<Option<ExternalIds>, ProviderError> {
        self.record("external_ids");
        replay(self.script.lock().unwrap().external_ids.get(&id), None)
    }

    async fn get_series(&self, id: i64) -> Result<Option<Details>, ProviderError> {
        self.record("series");
        replay(self.script.lock().unwrap().series.get(&id), None)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

// ============================================================================
// Mock Catalog
// ============================================================================

/// Primary catalog returning a settable list.
#[derive(Clone)]
pub struct MockCatalog {
    result: Arc<Mutex<Scripted<Vec<CatalogEntry>>>>,
    fetches: Arc<Mutex<usize>>,
    delay: Option<std::time::Duration>,
}

impl MockCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self {
            result: Arc::new(Mutex::new(Ok(entries))),
            fetches: Arc::default(),
            delay: None,
        }
    }

    /// Sleep before answering, to overlap concurrent callers.
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_result(&self, result: Scripted<Vec<CatalogEntry>>) {
        *self.result.lock().unwrap() = result;
    }

    pub fn fetches(&self) -> usize {
        *self.fetches.lock().unwrap()
    }
}

#[async_trait]
impl CatalogSource for MockCatalog {
    async fn fetch(&self, _request: &ListRequest) -> Result<Vec<CatalogEntry>, ProviderError> {
        *self.fetches.lock().unwrap() += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let result = self.result.lock().unwrap().clone();
        result.map_err(ProviderError::Other)
    }

    fn name(&self) -> &'static str {
        "mock-catalog"
    }
}

// ============================================================================
// Fixed Clock
// ============================================================================

/// Clock that only moves when told to.
#[derive(Clone)]
pub struct FixedClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}
