//! TMDB lookup provider adapter

use std::sync::Arc;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tmdb::{SearchMultiResult, TmdbClient};

use crate::{Details, ExternalIds, LookupProvider, MediaType, ProviderError, ProviderId, SearchHit};

/// TMDB lookup provider
pub struct TmdbProvider {
    client: Arc<TmdbClient>,
}

impl TmdbProvider {
    pub fn new(client: Arc<TmdbClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LookupProvider for TmdbProvider {
    async fn search_by_title(
        &self,
        title: &str,
        language: &str,
    ) -> Result<Vec<SearchHit>, ProviderError> {
        let cleaned = clean_title_for_search(title);
        let response = self.client.search_multi(&cleaned, language).await?;

        Ok(response
            .results
            .into_iter()
            .map(|result| match result {
                SearchMultiResult::Tv(show) => SearchHit {
                    id: ProviderId::tv(show.id),
                    title: show.name,
                    overview: non_empty(show.overview),
                },
                SearchMultiResult::Movie(movie) => SearchHit {
                    id: ProviderId::movie(movie.id),
                    title: movie.title,
                    overview: non_empty(movie.overview),
                },
            })
            .collect())
    }

    async fn get_details(
        &self,
        id: ProviderId,
        language: &str,
    ) -> Result<Option<Details>, ProviderError> {
        // TMDB echoes the original name when a translation is missing, so a
        // name equal to the original one is not counted as localized.
        let details = match id.media_type {
            MediaType::Tv => not_found_as_none(self.client.get_tv_details(id.id, language).await)?
                .map(|tv| localized(tv.name, tv.original_name, tv.overview)),
            MediaType::Movie => {
                not_found_as_none(self.client.get_movie_details(id.id, language).await)?
                    .map(|movie| localized(movie.title, movie.original_title, movie.overview))
            }
        };
        Ok(details)
    }

    async fn get_external_ids(&self, id: ProviderId) -> Result<Option<ExternalIds>, ProviderError> {
        let ids = match id.media_type {
            MediaType::Tv => self.client.get_tv_external_ids(id.id).await,
            MediaType::Movie => self.client.get_movie_external_ids(id.id).await,
        };

        Ok(not_found_as_none(ids)?.map(|ids| ExternalIds {
            secondary_id: ids.tvdb_id.filter(|id| *id > 0),
            imdb_id: ids.imdb_id.filter(|id| !id.is_empty()),
        }))
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

fn localized(name: String, original_name: String, overview: String) -> Details {
    let translated = name != original_name;
    Details {
        title: if translated { non_empty(name) } else { None },
        overview: non_empty(overview),
        original_title: non_empty(original_name),
        original_overview: None,
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn not_found_as_none<T>(result: tmdb::Result<T>) -> Result<Option<T>, ProviderError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(ProviderError::Tmdb(e)),
    }
}

/// Clean title for TMDB search by removing season and split-cour markers.
pub fn clean_title_for_search(title: &str) -> String {
    // Pattern to match split-cour markers: 第Xクール, 第X部分, Part X, Cour X
    static SPLIT_COUR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)(?:第\s*\d+\s*(?:クール|部分))|(?:\bPart\s*\d+\b)|(?:\bCour\s*\d+\b)")
            .unwrap()
    });

    // Pattern to match season markers: 第X季, 第X期, Season X, 2nd Season
    // Standalone "S\d" is left alone, it collides with real titles.
    static SEASON_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r"(?i)(?:第[0-9一二三四五六七八九十]+(?:季|期))|(?:\bSEASON\s*\d{1,2}\b)|(?:\b\d{1,2}(?:st|nd|rd|th)\s+Season\b)",
        )
        .unwrap()
    });

    let mut result = title.to_string();
    result = SPLIT_COUR_PATTERN.replace_all(&result, "").to_string();
    result = SEASON_PATTERN.replace_all(&result, "").to_string();
    let cleaned = result.split_whitespace().collect::<Vec<_>>().join(" ");

    if cleaned.is_empty() {
        title.trim().to_string()
    } else {
        cleaned
    }
}
