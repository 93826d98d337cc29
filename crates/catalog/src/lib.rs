//! Enrichment and caching engine for catalog lists.
//!
//! Raw records come from a primary [`CatalogSource`](metadata::CatalogSource)
//! and are cross-referenced against two
//! [`LookupProvider`](metadata::LookupProvider)s to fill in canonical ids and
//! localized text. Results are persisted as two-generation snapshots and
//! refreshed only inside fixed daily windows.
//!
//! ```text
//! Orchestrator
//!   ├─ ResultCache            (in-process, TTL)
//!   ├─ SnapshotStore ─► BlobStore
//!   ├─ FreshnessPolicy
//!   ├─ EnrichmentPipeline
//!   │    ├─ BoundedScheduler
//!   │    └─ MarkerStore
//!   └─ differ (carry_forward / merge / diff_new)
//! ```
//!
//! # Example
//!
//! ```ignore
//! let orchestrator = Orchestrator::new(catalog, pipeline, snapshots);
//! let items = orchestrator
//!     .get_list_cached_or_fresh(&ListRequest::new(CALENDAR_LIST))
//!     .await?;
//! ```

pub mod cache;
pub mod clock;
pub mod config;
pub mod differ;
mod error;
pub mod freshness;
pub mod marker;
mod models;
pub mod orchestrator;
pub mod pipeline;
pub mod scheduler;
pub mod snapshot;
pub mod store;

#[cfg(test)]
mod mocks;

pub use cache::{MemoryResultCache, ResultCache};
pub use clock::{Clock, SystemClock};
pub use config::Settings;
pub use error::{ConfigError, OrchestratorError, SnapshotError, StoreError};
pub use freshness::FreshnessPolicy;
pub use marker::{Marker, MarkerStore, Markers, Stage};
pub use models::{first_non_empty, Item, LocalizedText, Titles};
pub use orchestrator::{Orchestrator, Refreshed};
pub use pipeline::{EnrichmentPipeline, EnrichmentReport, PipelineOptions, StageReport};
pub use scheduler::{BoundedScheduler, TaskError, TaskOutcome};
pub use snapshot::{Generation, GenerationMeta, Snapshot, SnapshotStore};
pub use store::{BlobStore, FileBlobStore, MemoryBlobStore};
