//! Matching items across generations.
//!
//! An item matches an earlier one by primary-source id, or failing that by
//! normalized title. Matches carry first-seen timestamps forward and tell
//! which items are new.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::models::Item;

/// Lookup index over one generation
pub struct Matcher<'a> {
    items: &'a [Item],
    by_id: HashMap<&'a str, usize>,
    by_title: HashMap<String, usize>,
}

impl<'a> Matcher<'a> {
    pub fn new(items: &'a [Item]) -> Self {
        let mut by_id = HashMap::new();
        let mut by_title = HashMap::new();
        for (i, item) in items.iter().enumerate() {
            by_id.entry(item.source_id.as_str()).or_insert(i);
            if let Some(title) = item.normalized_title() {
                by_title.entry(title).or_insert(i);
            }
        }

        Self {
            items,
            by_id,
            by_title,
        }
    }

    pub fn find(&self, item: &Item) -> Option<&'a Item> {
        let index = self.by_id.get(item.source_id.as_str()).or_else(|| {
            item.normalized_title()
                .and_then(|title| self.by_title.get(&title))
        })?;
        self.items.get(*index)
    }
}

/// Merge freshly resolved items into a new generation.
///
/// Matched items keep their first-seen time, and their last-updated time when
/// nothing changed. Everything else is stamped with `now`. The result is
/// sorted newest first, undated items last.
pub fn merge(previous: &[Item], fresh: Vec<Item>, now: DateTime<Utc>) -> Vec<Item> {
    let matcher = Matcher::new(previous);

    let mut merged: Vec<Item> = fresh
        .into_iter()
        .map(|mut item| {
            match matcher.find(&item) {
                Some(old) if old.first_seen.is_some() => {
                    item.first_seen = old.first_seen;
                    item.updated_at = if item.same_content(old) {
                        old.updated_at.or(Some(now))
                    } else {
                        Some(now)
                    };
                }
                _ => {
                    item.first_seen = Some(now);
                    item.updated_at = Some(now);
                }
            }
            item
        })
        .collect();

    // Option orders None first, so reversing puts undated items last
    merged.sort_by(|a, b| b.first_seen.cmp(&a.first_seen));
    merged
}

/// Items of `current` with no match in `previous`.
pub fn diff_new(current: &[Item], previous: &[Item]) -> Vec<Item> {
    let matcher = Matcher::new(previous);
    current
        .iter()
        .filter(|item| matcher.find(item).is_none())
        .cloned()
        .collect()
}

/// Copy enrichment results from the previous generation onto raw catalog items.
///
/// Titles and catalog fields stay as the catalog returned them; ids, resolved
/// text and markers come from the match unless the raw item already has them.
pub fn carry_forward(previous: &[Item], fresh: &mut [Item]) -> usize {
    let matcher = Matcher::new(previous);
    let mut carried = 0;

    for item in fresh.iter_mut() {
        let Some(old) = matcher.find(item) else {
            continue;
        };
        item.reference_id = item.reference_id.or(old.reference_id);
        item.secondary_id = item.secondary_id.or(old.secondary_id);
        if item.reference_text.is_none() {
            item.reference_text = old.reference_text.clone();
        }
        if item.secondary_text.is_none() {
            item.secondary_text = old.secondary_text.clone();
        }
        if item.markers.is_empty() {
            item.markers = old.markers.clone();
        }
        carried += 1;
    }

    carried
}
