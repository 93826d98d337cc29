//! Provider traits consumed by the enrichment engine

use async_trait::async_trait;

use crate::{CatalogEntry, Details, ExternalIds, ListRequest, ProviderError, ProviderId, SearchHit};

/// A metadata provider the engine can cross-reference against.
///
/// Implementations return `Ok(empty)` / `Ok(None)` when the provider answered
/// but had nothing; `Err` is reserved for transport and provider-side failures.
#[async_trait]
pub trait LookupProvider: Send + Sync {
    /// Search records by title, most relevant first.
    async fn search_by_title(
        &self,
        title: &str,
        language: &str,
    ) -> Result<Vec<SearchHit>, ProviderError>;

    /// Localized title/description of a record.
    async fn get_details(
        &self,
        id: ProviderId,
        language: &str,
    ) -> Result<Option<Details>, ProviderError>;

    /// Ids of the same record in other providers.
    async fn get_external_ids(&self, _id: ProviderId) -> Result<Option<ExternalIds>, ProviderError> {
        Ok(None)
    }

    /// Base series record in its original language.
    async fn get_series(&self, _id: i64) -> Result<Option<Details>, ProviderError> {
        Ok(None)
    }

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// The primary catalog raw records are pulled from.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch(&self, request: &ListRequest) -> Result<Vec<CatalogEntry>, ProviderError>;

    fn name(&self) -> &'static str;
}
