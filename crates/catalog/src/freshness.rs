//! Time-windowed staleness decision for a stored generation.
//!
//! Refreshes only happen inside a few fixed daily UTC windows. Outside them a
//! generation stays fresh until it reaches the maximum validity.

use chrono::{DateTime, Duration, Timelike, Utc};

pub const DEFAULT_WINDOW_START_HOURS: [u32; 3] = [4, 12, 20];
pub const DEFAULT_WINDOW_MINUTES: i64 = 60;
pub const DEFAULT_MAX_VALIDITY_HOURS: i64 = 8;

#[derive(Debug, Clone)]
pub struct FreshnessPolicy {
    /// Daily window start hours (UTC), in order
    window_start_hours: Vec<u32>,
    window: Duration,
    max_validity: Duration,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_WINDOW_START_HOURS.to_vec(),
            Duration::minutes(DEFAULT_WINDOW_MINUTES),
            Duration::hours(DEFAULT_MAX_VALIDITY_HOURS),
        )
    }
}

impl FreshnessPolicy {
    pub fn new(window_start_hours: Vec<u32>, window: Duration, max_validity: Duration) -> Self {
        Self {
            window_start_hours,
            window,
            max_validity,
        }
    }

    /// Index of the refresh window containing `at`, if any.
    pub fn window_index(&self, at: DateTime<Utc>) -> Option<usize> {
        let minute_of_day = i64::from(at.hour() * 60 + at.minute());
        let length = self.window.num_minutes();

        self.window_start_hours.iter().position(|&hour| {
            let start = i64::from(hour) * 60;
            // windows may run past midnight
            let offset = (minute_of_day - start).rem_euclid(24 * 60);
            offset < length
        })
    }

    pub fn is_stale(&self, generated_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let age = now - generated_at;
        if age >= self.max_validity {
            return true;
        }

        match (self.window_index(generated_at), self.window_index(now)) {
            (_, None) => false,
            (None, Some(_)) => true,
            // same window index on an earlier day is a different window
            (Some(data), Some(current)) => data != current || age >= self.window,
        }
    }
}
