//! Threat trend over a 15-minute look-back, bucketed per minute
//!
//! Rebuilt from the full snapshot on every poll. Nothing carries over between
//! polls: when the backing entities age out or stop being returned, their
//! bucket disappears with them.

use crate::types::Entity;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Look-back horizon in milliseconds (15 minutes)
pub const TREND_WINDOW_MS: i64 = 15 * 60 * 1000;

/// Bucket width in milliseconds (60 seconds)
pub const BUCKET_WIDTH_MS: i64 = 60_000;

#[derive(Debug, Clone, PartialEq)]
pub struct TrendBucket {
    /// Bucket start, Unix milliseconds, aligned to [`BUCKET_WIDTH_MS`]
    pub start_ms: i64,
    /// `HH:MM` of the bucket start (UTC)
    pub label: String,
    pub total: u32,
    pub per_class: BTreeMap<String, u32>,
}

impl TrendBucket {
    fn new(start_ms: i64) -> Self {
        Self {
            start_ms,
            label: bucket_label(start_ms),
            total: 0,
            per_class: BTreeMap::new(),
        }
    }

    fn add(&mut self, class: &str) {
        self.total += 1;
        *self.per_class.entry(class.to_string()).or_insert(0) += 1;
    }
}

/// Floor a millisecond timestamp to its bucket start
pub fn bucket_start(timestamp_ms: i64) -> i64 {
    timestamp_ms.div_euclid(BUCKET_WIDTH_MS) * BUCKET_WIDTH_MS
}

fn bucket_label(start_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(start_ms)
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_default()
}

/// Build the trend series for `snapshot` as seen at `now`
///
/// An entity survives only while it is strictly younger than the look-back:
/// one created exactly 15 minutes before `now` is already out.
pub fn build_trend(snapshot: &[Entity], now: DateTime<Utc>) -> Vec<TrendBucket> {
    let now_ms = now.timestamp_millis();
    let mut buckets: BTreeMap<i64, TrendBucket> = BTreeMap::new();

    for entity in snapshot {
        let created_ms = entity.created_at_ms();
        if now_ms - created_ms >= TREND_WINDOW_MS {
            continue;
        }

        let start = bucket_start(created_ms);
        buckets
            .entry(start)
            .or_insert_with(|| TrendBucket::new(start))
            .add(&entity.class);
    }

    buckets.into_values().collect()
}
