//! Adapter boundary between the enrichment engine and the metadata providers.
//!
//! Everything provider-specific (endpoints, response shapes, quirks) lives
//! behind two traits:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              LookupProvider trait            │
//! │  search_by_title / get_details /             │
//! │  get_external_ids / get_series               │
//! └──────────────────────────────────────────────┘
//!            △                      △
//!   ┌────────┴─────┐        ┌───────┴──────┐
//!   │ TmdbProvider │        │ TvdbProvider │
//!   └──────────────┘        └──────────────┘
//!
//! ┌──────────────────────────────────────────────┐
//! │   CatalogSource trait: fetch(&ListRequest)   │
//! └──────────────────────────────────────────────┘
//!                       △
//!               ┌───────┴──────┐
//!               │ BgmtvCatalog │
//!               └──────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use metadata::{LookupProvider, TmdbProvider};
//! use std::sync::Arc;
//!
//! let provider = TmdbProvider::new(Arc::new(client));
//! let hits = provider.search_by_title("葬送のフリーレン", "en-US").await?;
//! ```

mod adapters;
mod error;
mod models;
mod provider;

pub use adapters::{clean_title_for_search, BgmtvCatalog, TmdbProvider, TvdbProvider, CALENDAR_LIST};
pub use error::ProviderError;
pub use models::{CatalogEntry, Details, ExternalIds, ListRequest, MediaType, ProviderId, SearchHit};
pub use provider::{CatalogSource, LookupProvider};
