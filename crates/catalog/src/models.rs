//! Items under enrichment

use chrono::{DateTime, Utc};
use metadata::{CatalogEntry, Details, MediaType, ProviderId};
use serde::{Deserialize, Serialize};

use crate::marker::Markers;

/// Returns the first candidate that is present and not blank.
///
/// Precedence chains between providers are written as an ordered candidate
/// list passed through this helper.
pub fn first_non_empty<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> Option<&'a str> {
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|candidate| !candidate.is_empty())
}

/// Alternate titles from the primary catalog. Used for matching and searching only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Titles {
    /// Localized/English title
    pub localized: Option<String>,
    /// Native/original title
    pub native: Option<String>,
    pub romanized: Option<String>,
}

impl Titles {
    /// The single best title to search providers with.
    pub fn search_title(&self) -> Option<&str> {
        first_non_empty([
            self.localized.as_deref(),
            self.native.as_deref(),
            self.romanized.as_deref(),
        ])
    }
}

/// Title and description resolved from one provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub title: Option<String>,
    pub overview: Option<String>,
}

impl LocalizedText {
    /// Text in the requested language only.
    pub fn localized(details: &Details) -> Option<Self> {
        Self::from_candidates(
            [details.title.as_deref()],
            [details.overview.as_deref()],
        )
    }

    /// Requested language first, original language as fallback.
    pub fn localized_or_original(details: &Details) -> Option<Self> {
        Self::from_candidates(
            [details.title.as_deref(), details.original_title.as_deref()],
            [
                details.overview.as_deref(),
                details.original_overview.as_deref(),
            ],
        )
    }

    fn from_candidates<'a, const N: usize>(
        titles: [Option<&'a str>; N],
        overviews: [Option<&'a str>; N],
    ) -> Option<Self> {
        let text = Self {
            title: first_non_empty(titles).map(str::to_string),
            overview: first_non_empty(overviews).map(str::to_string),
        };
        if text.title.is_none() && text.overview.is_none() {
            None
        } else {
            Some(text)
        }
    }
}

/// A content record under enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Id in the primary catalog; never changes across generations
    pub source_id: String,
    #[serde(default)]
    pub titles: Titles,
    #[serde(default)]
    pub media_type: MediaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Canonical id in the reference provider (TMDB)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<ProviderId>,
    /// Canonical id in the secondary provider (TVDB)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_text: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_text: Option<LocalizedText>,

    #[serde(default, skip_serializing_if = "Markers::is_empty")]
    pub markers: Markers,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_seen: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Item {
    pub fn new(source_id: impl Into<String>, titles: Titles) -> Self {
        Self {
            source_id: source_id.into(),
            titles,
            media_type: MediaType::Tv,
            air_date: None,
            image_url: None,
            reference_id: None,
            secondary_id: None,
            reference_text: None,
            secondary_text: None,
            markers: Markers::default(),
            first_seen: None,
            updated_at: None,
        }
    }

    /// Provider text as one unit: the reference provider's when present, else the secondary's.
    pub fn provider_text(&self) -> Option<&LocalizedText> {
        self.reference_text.as_ref().or(self.secondary_text.as_ref())
    }

    /// Title to show: provider text, then the catalog's own titles.
    pub fn display_title(&self) -> Option<&str> {
        first_non_empty([
            self.provider_text().and_then(|t| t.title.as_deref()),
            self.titles.localized.as_deref(),
            self.titles.native.as_deref(),
            self.titles.romanized.as_deref(),
        ])
    }

    /// Overview from the same provider as [`Item::display_title`].
    pub fn display_overview(&self) -> Option<&str> {
        first_non_empty([self.provider_text().and_then(|t| t.overview.as_deref())])
    }

    /// Lowercased, trimmed search title used to match items across generations.
    pub fn normalized_title(&self) -> Option<String> {
        self.titles.search_title().map(|t| t.to_lowercase())
    }

    /// Compares everything except markers and timestamps.
    pub fn same_content(&self, other: &Item) -> bool {
        self.titles == other.titles
            && self.media_type == other.media_type
            && self.air_date == other.air_date
            && self.image_url == other.image_url
            && self.reference_id == other.reference_id
            && self.secondary_id == other.secondary_id
            && self.reference_text == other.reference_text
            && self.secondary_text == other.secondary_text
    }
}

impl From<CatalogEntry> for Item {
    fn from(entry: CatalogEntry) -> Self {
        let mut item = Item::new(
            entry.source_id,
            Titles {
                localized: entry.title_localized,
                native: entry.title_native,
                romanized: entry.title_romanized,
            },
        );
        item.media_type = entry.media_type;
        item.air_date = entry.air_date;
        item.image_url = entry.image_url;
        item
    }
}
