//! Per-item, per-stage retry/backoff state.
//!
//! A stage that failed transiently is retried on the next pass; a stage whose
//! provider answered with nothing is left alone until the cooldown elapses.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Item;

/// Default cooldown after a provider had nothing to offer
pub const DEFAULT_NO_DATA_COOLDOWN_HOURS: i64 = 24;

/// One step of the enrichment pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    TitleSearch,
    Details,
    CrossReference,
    SecondaryDetails,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::TitleSearch => "title_search",
            Stage::Details => "details",
            Stage::CrossReference => "cross_reference",
            Stage::SecondaryDetails => "secondary_details",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Marker {
    /// Not attempted yet, or the last attempt found data
    #[default]
    Clear,
    /// Last attempt failed transiently
    Error,
    /// Provider answered but had nothing
    NoData { since: DateTime<Utc> },
}

/// Markers of one item, keyed by stage. `Clear` entries are not stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Markers(BTreeMap<Stage, Marker>);

impl Markers {
    pub fn get(&self, stage: Stage) -> Marker {
        self.0.get(&stage).copied().unwrap_or_default()
    }

    pub fn set(&mut self, stage: Stage, marker: Marker) {
        match marker {
            Marker::Clear => {
                self.0.remove(&stage);
            }
            other => {
                self.0.insert(stage, other);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Gates lookups per (item, stage) and records their outcome.
#[derive(Debug, Clone, Copy)]
pub struct MarkerStore {
    cooldown: Duration,
}

impl Default for MarkerStore {
    fn default() -> Self {
        Self::new(Duration::hours(DEFAULT_NO_DATA_COOLDOWN_HOURS))
    }
}

impl MarkerStore {
    pub fn new(cooldown: Duration) -> Self {
        Self { cooldown }
    }

    pub fn should_skip(&self, item: &Item, stage: Stage, now: DateTime<Utc>) -> bool {
        match item.markers.get(stage) {
            Marker::Clear | Marker::Error => false,
            Marker::NoData { since } => now - since < self.cooldown,
        }
    }

    pub fn mark_error<'a>(&self, items: impl IntoIterator<Item = &'a mut Item>, stage: Stage) {
        for item in items {
            item.markers.set(stage, Marker::Error);
        }
    }

    pub fn mark_no_data<'a>(
        &self,
        items: impl IntoIterator<Item = &'a mut Item>,
        stage: Stage,
        now: DateTime<Utc>,
    ) {
        for item in items {
            item.markers.set(stage, Marker::NoData { since: now });
        }
    }

    pub fn clear(&self, item: &mut Item, stage: Stage) {
        item.markers.set(stage, Marker::Clear);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Titles;
    use chrono::TimeZone;

    fn item() -> Item {
        Item::new("1", Titles::default())
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_clear_is_never_skipped() {
        let store = MarkerStore::default();
        assert!(!store.should_skip(&item(), Stage::TitleSearch, t0()));
    }

    #[test]
    fn test_no_data_cooldown() {
        let store = MarkerStore::default();
        let mut item = item();
        store.mark_no_data([&mut item], Stage::Details, t0());

        assert!(store.should_skip(&item, Stage::Details, t0() + Duration::hours(23)));
        assert!(!store.should_skip(&item, Stage::Details, t0() + Duration::hours(24)));
        assert!(!store.should_skip(&item, Stage::Details, t0() + Duration::hours(25)));
        // other stages are unaffected
        assert!(!store.should_skip(&item, Stage::TitleSearch, t0()));
    }

    #[test]
    fn test_error_is_retried_immediately() {
        let store = MarkerStore::default();
        let mut item = item();
        store.mark_error([&mut item], Stage::TitleSearch);
        assert!(!store.should_skip(&item, Stage::TitleSearch, t0()));
        assert_eq!(item.markers.get(Stage::TitleSearch), Marker::Error);
    }

    #[test]
    fn test_states_replace_each_other() {
        let store = MarkerStore::default();
        let mut item = item();

        store.mark_no_data([&mut item], Stage::TitleSearch, t0());
        store.mark_error([&mut item], Stage::TitleSearch);
        assert_eq!(item.markers.get(Stage::TitleSearch), Marker::Error);

        store.mark_no_data([&mut item], Stage::TitleSearch, t0());
        assert_eq!(
            item.markers.get(Stage::TitleSearch),
            Marker::NoData { since: t0() }
        );

        store.clear(&mut item, Stage::TitleSearch);
        assert_eq!(item.markers.get(Stage::TitleSearch), Marker::Clear);
        assert!(item.markers.is_empty());
    }

    #[test]
    fn test_markers_serde_shape() {
        let mut markers = Markers::default();
        markers.set(Stage::Details, Marker::NoData { since: t0() });
        markers.set(Stage::TitleSearch, Marker::Error);

        let json = serde_json::to_value(&markers).unwrap();
        assert_eq!(json["title_search"]["state"], "error");
        assert_eq!(json["details"]["state"], "no_data");

        let back: Markers = serde_json::from_value(json).unwrap();
        assert_eq!(back, markers);
    }
}
