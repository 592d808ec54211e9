//! Keyed threat markers on the map surface
//!
//! Each poll of the threats feed is a full snapshot. Reconciliation diffs the
//! snapshot against the registry of live markers and returns the create and
//! remove commands needed to bring the map in line.
//!
//! Markers are positioned once, at creation. A later poll that reports the
//! same id at a different location does NOT move the marker; operators read
//! the marker as the point where the track was first materialised.

use crate::types::{Entity, GeoPoint, Severity};
use std::collections::{HashMap, HashSet};

/// A threat marker as drawn on the map
#[derive(Debug, Clone, PartialEq)]
pub struct ThreatMarker {
    /// Position recorded when the marker was created
    pub position: GeoPoint,
    pub severity: Severity,
    /// Popup text, `"{class} ({confidence})"`
    pub label: String,
}

impl ThreatMarker {
    fn for_entity(entity: &Entity, position: GeoPoint) -> Self {
        Self {
            position,
            severity: entity.severity(),
            label: format!("{} ({})", entity.class, entity.confidence),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MarkerCommand {
    Create { id: String, marker: ThreatMarker },
    Remove { id: String },
}

/// Entity id -> live marker
#[derive(Debug, Clone, Default)]
pub struct MarkerRegistry {
    markers: HashMap<String, ThreatMarker>,
}

impl MarkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&ThreatMarker> {
        self.markers.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.markers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn ids(&self) -> HashSet<&str> {
        self.markers.keys().map(String::as_str).collect()
    }
}

/// Reconcile the marker registry against a threats snapshot
///
/// Steps:
/// 1. Ids present before the poll are candidates for removal
/// 2. Every entity with a valid location either gets a new marker (unknown id)
///    or keeps its existing one untouched (known id)
/// 3. Candidates not seen with a valid location in this snapshot are removed
///
/// Afterwards the registry's key set equals the set of snapshot ids that
/// carry a valid location. Creates are emitted in snapshot order, removes in
/// id order.
pub fn reconcile_markers(
    previous: MarkerRegistry,
    snapshot: &[Entity],
) -> (MarkerRegistry, Vec<MarkerCommand>) {
    let mut markers = previous.markers;
    let mut stale: HashSet<String> = markers.keys().cloned().collect();
    let mut commands = Vec::new();

    for entity in snapshot {
        let Some(position) = entity.location else {
            continue;
        };

        stale.remove(&entity.id);
        if markers.contains_key(&entity.id) {
            continue;
        }

        let marker = ThreatMarker::for_entity(entity, position);
        markers.insert(entity.id.clone(), marker.clone());
        commands.push(MarkerCommand::Create {
            id: entity.id.clone(),
            marker,
        });
    }

    let mut stale: Vec<String> = stale.into_iter().collect();
    stale.sort_unstable();
    for id in stale {
        markers.remove(&id);
        commands.push(MarkerCommand::Remove { id });
    }

    (MarkerRegistry { markers }, commands)
}
