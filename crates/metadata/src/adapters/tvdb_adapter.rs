//! TheTVDB lookup provider adapter

use std::sync::Arc;

use async_trait::async_trait;
use tvdb::TvdbClient;

use crate::{Details, LookupProvider, ProviderError, ProviderId, SearchHit};

/// TheTVDB lookup provider.
///
/// Only id-based lookups are supported; the engine reaches TVDB ids through
/// TMDB's external id mapping.
pub struct TvdbProvider {
    client: Arc<TvdbClient>,
}

impl TvdbProvider {
    pub fn new(client: Arc<TvdbClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LookupProvider for TvdbProvider {
    async fn search_by_title(
        &self,
        _title: &str,
        _language: &str,
    ) -> Result<Vec<SearchHit>, ProviderError> {
        Ok(vec![])
    }

    async fn get_details(
        &self,
        id: ProviderId,
        language: &str,
    ) -> Result<Option<Details>, ProviderError> {
        match self.client.get_series_translation(id.id, language).await {
            Ok(translation) => Ok(Some(Details {
                title: translation.name.filter(|s| !s.trim().is_empty()),
                overview: translation.overview.filter(|s| !s.trim().is_empty()),
                original_title: None,
                original_overview: None,
            })),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_series(&self, id: i64) -> Result<Option<Details>, ProviderError> {
        match self.client.get_series(id).await {
            Ok(series) => Ok(Some(Details {
                title: None,
                overview: None,
                original_title: Some(series.name).filter(|s| !s.trim().is_empty()),
                original_overview: series.overview.filter(|s| !s.trim().is_empty()),
            })),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &'static str {
        "tvdb"
    }
}
