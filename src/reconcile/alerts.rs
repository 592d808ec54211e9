//! Edge-triggered alert cue for high-confidence threats
//!
//! The condition "confidence >= 0.85" holds on every poll a threat stays
//! hot. The cue must fire once per id, on the first poll that sees it, for
//! the lifetime of the process. Ids are never evicted.

use crate::types::{Entity, HIGH_CONFIDENCE_THRESHOLD};
use std::collections::HashSet;

/// Confidence at or above which the alert cue fires. Fixed; not configurable.
pub const ALERT_THRESHOLD: f64 = HIGH_CONFIDENCE_THRESHOLD;

#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    pub id: String,
    pub class: String,
    pub confidence: f64,
}

/// Ids that have already raised the cue
#[derive(Debug, Clone, Default)]
pub struct AlertedSet {
    ids: HashSet<String>,
}

impl AlertedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Fire the cue for every hot entity not alerted before
pub fn detect_alerts(previous: AlertedSet, snapshot: &[Entity]) -> (AlertedSet, Vec<AlertEvent>) {
    let mut ids = previous.ids;
    let mut events = Vec::new();

    for entity in snapshot {
        if entity.confidence < ALERT_THRESHOLD {
            continue;
        }

        // insert() is false for ids already alerted, including repeats
        // within this snapshot
        if ids.insert(entity.id.clone()) {
            events.push(AlertEvent {
                id: entity.id.clone(),
                class: entity.class.clone(),
                confidence: entity.confidence,
            });
        }
    }

    (AlertedSet { ids }, events)
}
