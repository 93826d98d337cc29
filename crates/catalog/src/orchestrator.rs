//! Serving enriched lists from cache, snapshot or a fresh pipeline run.
//!
//! Read path, per list key:
//!
//! ```text
//! cache hit ─────────────────────────────────────────────► return
//! cache miss ─► load snapshot ─┬─ fresh ─────────► cache ► return
//!                              └─ stale / absent ─► fetch catalog
//!                                   ─► carry forward ─► enrich ─► merge
//!                                   ─► persist (best effort) ─► cache ► return
//!                                   (failed or empty: serve the stale snapshot)
//! ```
//!
//! The whole sequence runs under a per-key lock, so concurrent callers for the
//! same list share one refresh.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use metadata::{CatalogSource, ListRequest};
use serde::Serialize;

use crate::cache::{MemoryResultCache, ResultCache};
use crate::clock::{Clock, SystemClock};
use crate::differ;
use crate::error::{OrchestratorError, SnapshotError, StoreError};
use crate::freshness::FreshnessPolicy;
use crate::models::Item;
use crate::pipeline::{EnrichmentPipeline, EnrichmentReport};
use crate::snapshot::{Generation, Snapshot, SnapshotStore};

/// Result of a forced refresh
#[derive(Debug, Clone, Serialize)]
pub struct Refreshed {
    pub items: Vec<Item>,
    /// The snapshot as persisted
    pub snapshot: Snapshot,
    /// Items with no match in the generation this one replaced
    pub new_items: Vec<Item>,
    pub report: EnrichmentReport,
}

pub struct Orchestrator {
    catalog: Arc<dyn CatalogSource>,
    pipeline: EnrichmentPipeline,
    snapshots: SnapshotStore,
    freshness: FreshnessPolicy,
    cache: Arc<dyn ResultCache>,
    clock: Arc<dyn Clock>,
    locks: parking_lot::Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl Orchestrator {
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        pipeline: EnrichmentPipeline,
        snapshots: SnapshotStore,
    ) -> Self {
        Self {
            catalog,
            pipeline,
            snapshots,
            freshness: FreshnessPolicy::default(),
            cache: Arc::new(MemoryResultCache::default()),
            clock: Arc::new(SystemClock),
            locks: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    pub fn with_freshness(mut self, freshness: FreshnessPolicy) -> Self {
        self.freshness = freshness;
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn ResultCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Serve a list, refreshing it only when the stored generation is stale.
    ///
    /// Provider trouble never surfaces here: the stale snapshot is served
    /// instead. Errors are configuration errors, or a failed catalog fetch
    /// when nothing has been stored yet.
    pub async fn get_list_cached_or_fresh(
        &self,
        request: &ListRequest,
    ) -> Result<Vec<Item>, OrchestratorError> {
        let key = request.key();
        if let Some(items) = self.cache.get(&key, self.clock.now()).await {
            tracing::debug!("Cache hit for {}", key);
            return Ok(items);
        }

        let lock = self.lock_for(&key);
        let _guard = lock.lock().await;

        let now = self.clock.now();
        if let Some(items) = self.cache.get(&key, now).await {
            tracing::debug!("Cache filled for {} while waiting", key);
            return Ok(items);
        }

        let stored = match self.snapshots.load(&key).await {
            Ok(stored) => stored,
            Err(e) if is_config_error(&e) => return Err(e.into()),
            Err(e) => {
                tracing::warn!("Ignoring unreadable snapshot {}: {}", key, e);
                None
            }
        };

        if let Some(snapshot) = &stored {
            if !self.freshness.is_stale(snapshot.current.generated_at, now) {
                tracing::debug!(
                    "Snapshot {} from {} is fresh",
                    key,
                    snapshot.current.generated_at
                );
                let items = snapshot.current.items.clone();
                self.cache.put(&key, items.clone(), now).await;
                return Ok(items);
            }
        }

        let outcome = self.rebuild(request, stored.as_ref(), now).await;
        match outcome {
            Ok((items, _)) if !items.is_empty() => {
                let snapshot = next_snapshot(stored, items, now, self.describe(&key));
                let items = snapshot.current.items.clone();
                match self.snapshots.save(&key, snapshot).await {
                    Ok(_) => {}
                    Err(e) if is_config_error(&e) => return Err(e.into()),
                    Err(e) => tracing::warn!("Serving {} without persisting it: {}", key, e),
                }
                self.cache.put(&key, items.clone(), now).await;
                Ok(items)
            }
            outcome => {
                let failure = outcome.err();
                match &failure {
                    Some(e) => tracing::warn!("Refresh of {} failed: {}", key, e),
                    None => tracing::warn!("Refresh of {} returned no items", key),
                }

                match (stored, failure) {
                    (Some(snapshot), _) => {
                        tracing::info!(
                            "Serving stale snapshot {} from {}",
                            key,
                            snapshot.current.generated_at
                        );
                        let items = snapshot.current.items;
                        self.cache.put(&key, items.clone(), now).await;
                        Ok(items)
                    }
                    (None, Some(e)) => {
                        tracing::error!("No snapshot to fall back to for {}", key);
                        Err(e)
                    }
                    (None, None) => Ok(Vec::new()),
                }
            }
        }
    }

    /// Rebuild and persist a list now, regardless of freshness.
    ///
    /// Every failure surfaces, including an empty catalog answer; stale data
    /// is never served from here.
    pub async fn force_refresh(&self, request: &ListRequest) -> Result<Refreshed, OrchestratorError> {
        let key = request.key();
        let lock = self.lock_for(&key);
        let _guard = lock.lock().await;
        let now = self.clock.now();

        let stored = match self.snapshots.load(&key).await {
            Ok(stored) => stored,
            Err(e @ (SnapshotError::Malformed(_) | SnapshotError::TooLarge { .. })) => {
                tracing::warn!("Replacing unreadable snapshot {}: {}", key, e);
                None
            }
            Err(e) => return Err(e.into()),
        };

        let (items, report) = self.rebuild(request, stored.as_ref(), now).await?;
        if items.is_empty() {
            tracing::error!("Refresh of {} returned no items", key);
            return Err(OrchestratorError::EmptyRefresh(key));
        }

        let snapshot = next_snapshot(stored, items, now, self.describe(&key));
        let new_items = differ::diff_new(&snapshot.current.items, snapshot.previous_items());
        let snapshot = self.snapshots.save(&key, snapshot).await?;

        let items = snapshot.current.items.clone();
        self.cache.put(&key, items.clone(), now).await;
        tracing::info!(
            "Refreshed {}: {} items, {} new",
            key,
            items.len(),
            new_items.len()
        );

        Ok(Refreshed {
            items,
            snapshot,
            new_items,
            report,
        })
    }

    /// Items of the stored current generation that the previous one lacked.
    pub async fn whats_new(&self, request: &ListRequest) -> Result<Vec<Item>, OrchestratorError> {
        let key = request.key();
        let Some(snapshot) = self.snapshots.load(&key).await? else {
            return Ok(Vec::new());
        };

        match &snapshot.previous {
            Some(previous) if previous.meta.items_dropped => {
                tracing::warn!("Previous generation of {} was dropped to fit the store", key);
                Ok(Vec::new())
            }
            _ => Ok(differ::diff_new(
                &snapshot.current.items,
                snapshot.previous_items(),
            )),
        }
    }

    /// Fetch the raw list and enrich it, reusing what the stored generation knows.
    async fn rebuild(
        &self,
        request: &ListRequest,
        stored: Option<&Snapshot>,
        now: DateTime<Utc>,
    ) -> Result<(Vec<Item>, EnrichmentReport), OrchestratorError> {
        let entries = self.catalog.fetch(request).await?;
        tracing::info!(
            "Fetched {} entries for {} from {}",
            entries.len(),
            request.key(),
            self.catalog.name()
        );

        let mut items: Vec<Item> = entries.into_iter().map(Item::from).collect();
        if items.is_empty() {
            return Ok((items, EnrichmentReport::default()));
        }

        if let Some(snapshot) = stored {
            let carried = differ::carry_forward(&snapshot.current.items, &mut items);
            tracing::debug!("Carried enrichment forward for {} items", carried);
        }

        let report = self.pipeline.run(&mut items, now).await;
        Ok((items, report))
    }

    fn describe(&self, key: &str) -> String {
        format!("{} from {}", key, self.catalog.name())
    }

    /// Per-key refresh lock. Entries nobody else holds are dropped on the way.
    fn lock_for(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock();
        locks.retain(|held, lock| held == key || Arc::strong_count(lock) > 1);
        locks.entry(key.to_string()).or_default().clone()
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.locks.lock().len()
    }
}

fn next_snapshot(
    stored: Option<Snapshot>,
    items: Vec<Item>,
    now: DateTime<Utc>,
    description: String,
) -> Snapshot {
    match stored {
        Some(snapshot) => {
            let merged = differ::merge(&snapshot.current.items, items, now);
            snapshot.advance(Generation::new(merged, now, description))
        }
        None => Snapshot::first(Generation::new(
            differ::merge(&[], items, now),
            now,
            description,
        )),
    }
}

fn is_config_error(e: &SnapshotError) -> bool {
    matches!(e, SnapshotError::Store(StoreError::NotConfigured))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::{MarkerStore, Stage};
    use crate::mocks::{entry, FixedClock, MockCatalog, MockLookupProvider};
    use crate::pipeline::PipelineOptions;
    use crate::snapshot::DEFAULT_MAX_DOCUMENT_BYTES;
    use crate::store::{BlobStore, FileBlobStore, MemoryBlobStore};
    use chrono::{Duration, TimeZone};
    use metadata::{Details, LookupProvider, ProviderId, SearchHit};

    struct Harness {
        orchestrator: Orchestrator,
        catalog: MockCatalog,
        reference: Arc<MockLookupProvider>,
        blobs: Arc<MemoryBlobStore>,
        clock: FixedClock,
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, hour, minute, 0).unwrap()
    }

    fn harness(catalog: MockCatalog) -> Harness {
        let reference = Arc::new(MockLookupProvider::new("tmdb"));
        reference.on_search(
            "Frieren",
            Ok(vec![SearchHit {
                id: ProviderId::tv(209867),
                title: "Frieren".to_string(),
                overview: None,
            }]),
        );
        reference.on_details(
            ProviderId::tv(209867),
            Ok(Some(Details {
                title: Some("Frieren: Beyond Journey's End".to_string()),
                overview: Some("An elf mage".to_string()),
                original_title: None,
                original_overview: None,
            })),
        );
        let secondary = Arc::new(MockLookupProvider::new("tvdb"));

        let pipeline = EnrichmentPipeline::new(
            reference.clone() as Arc<dyn LookupProvider>,
            secondary as Arc<dyn LookupProvider>,
            MarkerStore::default(),
            PipelineOptions::default(),
        );
        let blobs = Arc::new(MemoryBlobStore::new());
        let clock = FixedClock::new(at(4, 30));

        let orchestrator = Orchestrator::new(
            Arc::new(catalog.clone()),
            pipeline,
            SnapshotStore::new(blobs.clone(), DEFAULT_MAX_DOCUMENT_BYTES),
        )
        .with_clock(Arc::new(clock.clone()));

        Harness {
            orchestrator,
            catalog,
            reference,
            blobs,
            clock,
        }
    }

    fn calendar() -> ListRequest {
        ListRequest::new("calendar")
    }

    #[tokio::test]
    async fn test_first_read_enriches_persists_and_caches() {
        let h = harness(MockCatalog::new(vec![entry("1", "Frieren"), entry("2", "Unknown")]));

        let items = h.orchestrator.get_list_cached_or_fresh(&calendar()).await.unwrap();
        assert_eq!(items.len(), 2);
        assert!(items
            .iter()
            .any(|item| item.display_title() == Some("Frieren: Beyond Journey's End")));
        assert!(items.iter().all(|item| item.first_seen == Some(at(4, 30))));
        assert_eq!(h.blobs.len(), 1);

        h.orchestrator.get_list_cached_or_fresh(&calendar()).await.unwrap();
        assert_eq!(h.catalog.fetches(), 1);
    }

    #[tokio::test]
    async fn test_fresh_snapshot_served_without_refetch() {
        let h = harness(MockCatalog::new(vec![entry("1", "Frieren")]));
        h.orchestrator.force_refresh(&calendar()).await.unwrap();

        h.orchestrator.cache.invalidate("calendar").await;
        h.clock.set(at(4, 45));
        let items = h.orchestrator.get_list_cached_or_fresh(&calendar()).await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(h.catalog.fetches(), 1);
    }

    #[tokio::test]
    async fn test_stale_snapshot_preferred_over_empty_refresh() {
        let h = harness(MockCatalog::new(vec![entry("1", "Frieren"), entry("2", "Other")]));
        h.orchestrator.force_refresh(&calendar()).await.unwrap();

        h.catalog.set_result(Ok(vec![]));
        h.orchestrator.cache.invalidate("calendar").await;
        h.clock.set(at(12, 15));

        let items = h.orchestrator.get_list_cached_or_fresh(&calendar()).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(h.catalog.fetches(), 2);

        let err = h.orchestrator.force_refresh(&calendar()).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::EmptyRefresh(_)));
        // the stored generation is untouched
        let stored = h.orchestrator.snapshots.load("calendar").await.unwrap().unwrap();
        assert_eq!(stored.current.items.len(), 2);
    }

    #[tokio::test]
    async fn test_catalog_failure_falls_back_to_stale() {
        let h = harness(MockCatalog::new(vec![entry("1", "Frieren")]));
        h.orchestrator.force_refresh(&calendar()).await.unwrap();

        h.catalog.set_result(Err("502 Bad Gateway".to_string()));
        h.orchestrator.cache.invalidate("calendar").await;
        h.clock.set(at(20, 10));

        let items = h.orchestrator.get_list_cached_or_fresh(&calendar()).await.unwrap();
        assert_eq!(items.len(), 1);

        assert!(matches!(
            h.orchestrator.force_refresh(&calendar()).await,
            Err(OrchestratorError::Catalog(_))
        ));
    }

    #[tokio::test]
    async fn test_catalog_failure_without_snapshot_propagates() {
        let catalog = MockCatalog::new(vec![]);
        catalog.set_result(Err("timeout".to_string()));
        let h = harness(catalog);

        assert!(matches!(
            h.orchestrator.get_list_cached_or_fresh(&calendar()).await,
            Err(OrchestratorError::Catalog(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_catalog_without_snapshot_is_empty_list() {
        let h = harness(MockCatalog::new(vec![]));
        let items = h.orchestrator.get_list_cached_or_fresh(&calendar()).await.unwrap();
        assert!(items.is_empty());
        assert!(h.blobs.is_empty());
    }

    #[tokio::test]
    async fn test_missing_store_root_is_config_error() {
        let pipeline = EnrichmentPipeline::new(
            Arc::new(MockLookupProvider::new("tmdb")),
            Arc::new(MockLookupProvider::new("tvdb")),
            MarkerStore::default(),
            PipelineOptions::default(),
        );
        let orchestrator = Orchestrator::new(
            Arc::new(MockCatalog::new(vec![entry("1", "Frieren")])),
            pipeline,
            SnapshotStore::new(Arc::new(FileBlobStore::new(None)), DEFAULT_MAX_DOCUMENT_BYTES),
        );

        assert!(matches!(
            orchestrator.get_list_cached_or_fresh(&calendar()).await,
            Err(OrchestratorError::Config(_))
        ));
        assert!(matches!(
            orchestrator.force_refresh(&calendar()).await,
            Err(OrchestratorError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_snapshot_treated_as_absent() {
        let h = harness(MockCatalog::new(vec![entry("1", "Frieren")]));
        h.blobs
            .write("calendar", Some(b"{\"current\":".to_vec()))
            .await
            .unwrap();

        let items = h.orchestrator.get_list_cached_or_fresh(&calendar()).await.unwrap();

        assert_eq!(items.len(), 1);
        let stored = h.orchestrator.snapshots.load("calendar").await.unwrap().unwrap();
        assert!(stored.previous.is_none());
    }

    #[tokio::test]
    async fn test_force_refresh_reports_new_items() {
        let h = harness(MockCatalog::new(vec![entry("1", "Frieren")]));

        let first = h.orchestrator.force_refresh(&calendar()).await.unwrap();
        assert_eq!(first.new_items.len(), 1);
        assert!(first.snapshot.previous.is_none());

        h.catalog
            .set_result(Ok(vec![entry("1", "Frieren"), entry("7", "Dandadan")]));
        h.clock.advance(Duration::hours(8));
        let second = h.orchestrator.force_refresh(&calendar()).await.unwrap();

        let new: Vec<_> = second.new_items.iter().map(|i| i.source_id.as_str()).collect();
        assert_eq!(new, vec!["7"]);
        assert_eq!(second.items[0].source_id, "7");
        assert_eq!(second.snapshot.previous_items().len(), 1);
        // first-seen survives the refresh
        let frieren = second.items.iter().find(|i| i.source_id == "1").unwrap();
        assert_eq!(frieren.first_seen, Some(at(4, 30)));

        let new = h.orchestrator.whats_new(&calendar()).await.unwrap();
        assert_eq!(new.len(), 1);
    }

    #[tokio::test]
    async fn test_enrichment_carries_over_between_refreshes() {
        let h = harness(MockCatalog::new(vec![entry("1", "Frieren"), entry("2", "Unknown")]));
        h.orchestrator.force_refresh(&calendar()).await.unwrap();
        assert_eq!(h.reference.calls_to("search"), 2);

        h.clock.advance(Duration::hours(8));
        let refreshed = h.orchestrator.force_refresh(&calendar()).await.unwrap();

        // resolved ids are reused and the no-data cooldown still holds
        assert_eq!(h.reference.calls_to("search"), 2);
        assert_eq!(h.reference.calls_to("details"), 1);
        assert_eq!(refreshed.report.title_search.skipped, 1);
        let unknown = refreshed.items.iter().find(|i| i.source_id == "2").unwrap();
        assert!(matches!(
            unknown.markers.get(Stage::TitleSearch),
            crate::marker::Marker::NoData { .. }
        ));
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_refresh() {
        let catalog = MockCatalog::new(vec![entry("1", "Frieren")])
            .with_delay(std::time::Duration::from_millis(50));
        let h = harness(catalog);

        let request = calendar();

        let (a, b) = tokio::join!(
            h.orchestrator.get_list_cached_or_fresh(&request),
            h.orchestrator.get_list_cached_or_fresh(&request),
        );

        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(h.catalog.fetches(), 1);
    }

    #[tokio::test]
    async fn test_idle_key_locks_are_released() {
        let h = harness(MockCatalog::new(vec![entry("1", "Frieren")]));

        for weekday in 1..=7 {
            let request = calendar().with_weekday(weekday);
            h.orchestrator.force_refresh(&request).await.unwrap();
        }

        assert_eq!(h.orchestrator.tracked_locks(), 1);
    }
}
