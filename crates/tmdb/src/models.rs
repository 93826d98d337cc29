//! Response shapes, reduced to the fields used for title lookups.
//!
//! TMDB returns `""` rather than `null` for missing text, hence the
//! `#[serde(default)]` on string fields.

use serde::{Deserialize, Serialize};

/// TV entry of a search result page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvShow {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub overview: String,
    pub first_air_date: Option<String>,
}

/// Movie entry of a search result page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub overview: String,
    pub release_date: Option<String>,
}

/// Non-person hit of GET /search/multi
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "media_type", rename_all = "snake_case")]
pub enum SearchMultiResult {
    Tv(TvShow),
    Movie(Movie),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub page: i64,
    pub results: Vec<T>,
    pub total_pages: i64,
    pub total_results: i64,
}

/// GET /tv/{id}. `name` falls back to `original_name` when no translation exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvShowDetails {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub original_name: String,
    #[serde(default)]
    pub overview: String,
}

/// GET /movie/{id}. Same fallback as [`TvShowDetails`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieDetails {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub original_title: String,
    #[serde(default)]
    pub overview: String,
}

/// GET /{tv|movie}/{id}/external_ids
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalIds {
    pub imdb_id: Option<String>,
    pub tvdb_id: Option<i64>,
}
