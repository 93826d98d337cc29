//! Staged, deduplicated, cross-provider enrichment.
//!
//! Stages run strictly one after another; lookups inside a stage go through
//! the [`BoundedScheduler`]. Each lookup serves every item sharing its key:
//!
//! 1. title search on the reference provider, keyed by search title
//! 2. reference details, keyed by reference id
//! 3. reference external ids (only items still without localized text), keyed by reference id
//! 4. secondary details (same items), keyed by secondary id
//!
//! Once an item has reference text it never reaches stages 3 and 4.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use metadata::{Details, LookupProvider, ProviderError, ProviderId};
use serde::Serialize;

use crate::marker::{MarkerStore, Stage};
use crate::models::{Item, LocalizedText};
use crate::scheduler::{BoundedScheduler, TaskError, TaskOutcome};

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub concurrency: usize,
    pub call_timeout: Option<Duration>,
    /// Language requested from the reference provider, e.g. `en-US`
    pub reference_language: String,
    /// Language requested from the secondary provider, e.g. `eng`
    pub secondary_language: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            concurrency: crate::scheduler::DEFAULT_CONCURRENCY,
            call_timeout: Some(Duration::from_secs(20)),
            reference_language: "en-US".to_string(),
            secondary_language: "eng".to_string(),
        }
    }
}

/// Counters for one stage of one pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StageReport {
    /// Provider calls issued (one per dedup key)
    pub lookups: usize,
    pub resolved: usize,
    pub no_data: usize,
    pub failed: usize,
    /// Items held back by a no-data cooldown
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentReport {
    pub title_search: StageReport,
    pub details: StageReport,
    pub cross_reference: StageReport,
    pub secondary_details: StageReport,
}

impl EnrichmentReport {
    pub fn lookups(&self) -> usize {
        self.title_search.lookups
            + self.details.lookups
            + self.cross_reference.lookups
            + self.secondary_details.lookups
    }
}

/// Items sharing one lookup key
struct Group<K> {
    key: K,
    members: Vec<usize>,
}

pub struct EnrichmentPipeline {
    reference: Arc<dyn LookupProvider>,
    secondary: Arc<dyn LookupProvider>,
    markers: MarkerStore,
    scheduler: BoundedScheduler,
    options: PipelineOptions,
}

impl EnrichmentPipeline {
    pub fn new(
        reference: Arc<dyn LookupProvider>,
        secondary: Arc<dyn LookupProvider>,
        markers: MarkerStore,
        options: PipelineOptions,
    ) -> Self {
        let mut scheduler = BoundedScheduler::new(options.concurrency);
        if let Some(timeout) = options.call_timeout {
            scheduler = scheduler.with_timeout(timeout);
        }

        Self {
            reference,
            secondary,
            markers,
            scheduler,
            options,
        }
    }

    /// Run one enrichment pass over `items`, mutating them in place.
    pub async fn run(&self, items: &mut [Item], now: DateTime<Utc>) -> EnrichmentReport {
        let report = EnrichmentReport {
            title_search: self.search_titles(items, now).await,
            details: self.fetch_details(items, now).await,
            cross_reference: self.cross_reference(items, now).await,
            secondary_details: self.fetch_secondary(items, now).await,
        };

        tracing::info!(
            "Enrichment pass over {} items: {} lookups (search {}/{}, details {}/{}, xref {}/{}, secondary {}/{} resolved)",
            items.len(),
            report.lookups(),
            report.title_search.resolved,
            report.title_search.lookups,
            report.details.resolved,
            report.details.lookups,
            report.cross_reference.resolved,
            report.cross_reference.lookups,
            report.secondary_details.resolved,
            report.secondary_details.lookups,
        );

        report
    }

    async fn search_titles(&self, items: &mut [Item], now: DateTime<Utc>) -> StageReport {
        let stage = Stage::TitleSearch;
        let (groups, skipped) = self.group(items, stage, now, |item| {
            if item.reference_id.is_some() || item.secondary_id.is_some() {
                return None;
            }
            item.titles.search_title().map(str::to_string)
        });

        let language = self.options.reference_language.as_str();
        let outcomes = self
            .lookup(&groups, |title: String| async move {
                let hits = self.reference.search_by_title(&title, language).await?;
                Ok::<_, ProviderError>(hits.into_iter().next().map(|hit| hit.id))
            })
            .await;

        let mut report = self.settle(stage, items, groups, outcomes, now, |item, id: &ProviderId| {
            if item.reference_id.is_none() {
                item.reference_id = Some(*id);
            }
        });
        report.skipped = skipped;
        report
    }

    async fn fetch_details(&self, items: &mut [Item], now: DateTime<Utc>) -> StageReport {
        let stage = Stage::Details;
        let (groups, skipped) = self.group(items, stage, now, |item| {
            if item.reference_text.is_some() {
                return None;
            }
            item.reference_id
        });

        let language = self.options.reference_language.as_str();
        let outcomes = self
            .lookup(&groups, |id: ProviderId| async move {
                let details = self.reference.get_details(id, language).await?;
                Ok::<_, ProviderError>(details.as_ref().and_then(LocalizedText::localized))
            })
            .await;

        let mut report = self.settle(stage, items, groups, outcomes, now, |item, text| {
            item.reference_text = Some(LocalizedText::clone(text));
            item.secondary_text = None;
        });
        report.skipped = skipped;
        report
    }

    async fn cross_reference(&self, items: &mut [Item], now: DateTime<Utc>) -> StageReport {
        let stage = Stage::CrossReference;
        let (groups, skipped) = self.group(items, stage, now, |item| {
            if item.reference_text.is_some() || item.secondary_id.is_some() {
                return None;
            }
            item.reference_id
        });

        let outcomes = self
            .lookup(&groups, |id: ProviderId| async move {
                let ids = self.reference.get_external_ids(id).await?;
                Ok::<_, ProviderError>(ids.and_then(|ids| ids.secondary_id))
            })
            .await;

        let mut report = self.settle(stage, items, groups, outcomes, now, |item, id: &i64| {
            item.secondary_id = Some(*id);
        });
        report.skipped = skipped;
        report
    }

    async fn fetch_secondary(&self, items: &mut [Item], now: DateTime<Utc>) -> StageReport {
        let stage = Stage::SecondaryDetails;
        let (groups, skipped) = self.group(items, stage, now, |item| {
            if item.reference_text.is_some() || item.secondary_text.is_some() {
                return None;
            }
            item.secondary_id
        });

        let language = self.options.secondary_language.as_str();
        let outcomes = self
            .lookup(&groups, |id: i64| async move {
                let details = self.secondary_details(id, language).await?;
                Ok::<_, ProviderError>(
                    details
                        .as_ref()
                        .and_then(LocalizedText::localized_or_original),
                )
            })
            .await;

        let mut report = self.settle(stage, items, groups, outcomes, now, |item, text| {
            item.secondary_text = Some(LocalizedText::clone(text));
        });
        report.skipped = skipped;
        report
    }

    /// Translation first; the original-language series record fills what it lacks.
    async fn secondary_details(
        &self,
        id: i64,
        language: &str,
    ) -> Result<Option<Details>, ProviderError> {
        let translated = self
            .secondary
            .get_details(ProviderId::tv(id), language)
            .await?
            .unwrap_or_default();
        if translated.title.is_some() && translated.overview.is_some() {
            return Ok(Some(translated));
        }

        let series = match self.secondary.get_series(id).await {
            Ok(series) => series,
            Err(e) if translated.has_localized() => {
                tracing::warn!("Series {} lookup failed, keeping partial translation: {}", id, e);
                return Ok(Some(translated));
            }
            Err(e) => return Err(e),
        };
        let Some(series) = series else {
            return Ok(Some(translated).filter(Details::has_localized));
        };

        Ok(Some(Details {
            original_title: translated.original_title.or(series.original_title),
            original_overview: translated.original_overview.or(series.original_overview),
            ..translated
        }))
    }

    /// Group eligible items by lookup key, dropping those a marker holds back.
    ///
    /// Returns the groups in first-seen key order and the number of skipped items.
    fn group<K, F>(
        &self,
        items: &[Item],
        stage: Stage,
        now: DateTime<Utc>,
        key_of: F,
    ) -> (Vec<Group<K>>, usize)
    where
        K: Eq + Hash + Clone,
        F: Fn(&Item) -> Option<K>,
    {
        let mut groups: Vec<Group<K>> = Vec::new();
        let mut index: HashMap<K, usize> = HashMap::new();
        let mut skipped = 0;

        for (i, item) in items.iter().enumerate() {
            let Some(key) = key_of(item) else {
                continue;
            };
            if self.markers.should_skip(item, stage, now) {
                tracing::debug!("Skipping {} for item {}: no-data cooldown", stage, item.source_id);
                skipped += 1;
                continue;
            }
            match index.get(&key) {
                Some(&g) => groups[g].members.push(i),
                None => {
                    index.insert(key.clone(), groups.len());
                    groups.push(Group {
                        key,
                        members: vec![i],
                    });
                }
            }
        }

        (groups, skipped)
    }

    /// One scheduled lookup per group. `Ok(None)` means the provider had nothing.
    async fn lookup<K, V, F, Fut>(
        &self,
        groups: &[Group<K>],
        lookup: F,
    ) -> Vec<TaskOutcome<Option<V>, ProviderError>>
    where
        K: Clone,
        F: Fn(K) -> Fut,
        Fut: Future<Output = Result<Option<V>, ProviderError>>,
    {
        let lookup = &lookup;
        let tasks: Vec<_> = groups
            .iter()
            .map(|group| {
                let key = group.key.clone();
                move || lookup(key)
            })
            .collect();

        self.scheduler.run(tasks).await
    }

    /// Write lookup outcomes back to every member of each group, in submission order.
    fn settle<K, V, F>(
        &self,
        stage: Stage,
        items: &mut [Item],
        groups: Vec<Group<K>>,
        outcomes: Vec<TaskOutcome<Option<V>, ProviderError>>,
        now: DateTime<Utc>,
        assign: F,
    ) -> StageReport
    where
        K: std::fmt::Debug,
        F: Fn(&mut Item, &V),
    {
        let mut report = StageReport {
            lookups: groups.len(),
            ..StageReport::default()
        };

        for (group, outcome) in groups.into_iter().zip(outcomes) {
            match outcome {
                Ok(Some(value)) => {
                    for &i in &group.members {
                        assign(&mut items[i], &value);
                        self.markers.clear(&mut items[i], stage);
                    }
                    report.resolved += 1;
                }
                Ok(None) => {
                    tracing::debug!("No {} data for {:?}", stage, group.key);
                    for &i in &group.members {
                        self.markers.mark_no_data([&mut items[i]], stage, now);
                    }
                    report.no_data += 1;
                }
                Err(e) => {
                    let reason = match e {
                        TaskError::Failed(e) => e.to_string(),
                        TaskError::TimedOut(after) => format!("timed out after {:?}", after),
                    };
                    tracing::warn!("{} lookup failed for {:?}: {}", stage, group.key, reason);
                    for &i in &group.members {
                        self.markers.mark_error([&mut items[i]], stage);
                    }
                    report.failed += 1;
                }
            }
        }

        report
    }
}
