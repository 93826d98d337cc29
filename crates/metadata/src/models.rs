//! Provider-neutral shapes exchanged across the adapter boundary

use serde::{Deserialize, Serialize};

/// Media type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Tv,
    Movie,
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaType::Tv => write!(f, "tv"),
            MediaType::Movie => write!(f, "movie"),
        }
    }
}

/// An id issued by a lookup provider. TMDB ids are only unique per media type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderId {
    pub id: i64,
    pub media_type: MediaType,
}

impl ProviderId {
    pub fn tv(id: i64) -> Self {
        Self {
            id,
            media_type: MediaType::Tv,
        }
    }

    pub fn movie(id: i64) -> Self {
        Self {
            id,
            media_type: MediaType::Movie,
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.media_type, self.id)
    }
}

/// One result of a title search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: ProviderId,
    pub title: String,
    pub overview: Option<String>,
}

/// Title and description of a record.
///
/// `title`/`overview` hold the text in the requested language and are `None`
/// when the provider has no translation; `original_*` hold the text in the
/// record's original language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Details {
    pub title: Option<String>,
    pub overview: Option<String>,
    pub original_title: Option<String>,
    pub original_overview: Option<String>,
}

impl Details {
    /// Whether the provider returned anything in the requested language.
    pub fn has_localized(&self) -> bool {
        non_empty(&self.title) || non_empty(&self.overview)
    }
}

fn non_empty(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}

/// Cross-reference ids a provider knows for one of its records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIds {
    /// Id of the same record in the secondary provider
    pub secondary_id: Option<i64>,
    pub imdb_id: Option<String>,
}

/// Which list to pull from the primary catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListRequest {
    /// Logical list name, e.g. `calendar`
    pub list: String,
    /// Restrict to one weekday (1 = Monday … 7 = Sunday)
    pub weekday: Option<i32>,
    pub limit: Option<usize>,
}

impl ListRequest {
    pub fn new(list: impl Into<String>) -> Self {
        Self {
            list: list.into(),
            weekday: None,
            limit: None,
        }
    }

    pub fn with_weekday(mut self, weekday: i32) -> Self {
        self.weekday = Some(weekday);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Stable key naming the persisted snapshot of this list.
    pub fn key(&self) -> String {
        let mut key = self.list.clone();
        if let Some(weekday) = self.weekday {
            key.push_str(&format!("-wd{}", weekday));
        }
        if let Some(limit) = self.limit {
            key.push_str(&format!("-n{}", limit));
        }
        key
    }
}

/// A raw record as the primary catalog returns it, before enrichment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub source_id: String,
    pub title_localized: Option<String>,
    pub title_native: Option<String>,
    pub title_romanized: Option<String>,
    pub media_type: MediaType,
    pub air_date: Option<String>,
    pub image_url: Option<String>,
}
