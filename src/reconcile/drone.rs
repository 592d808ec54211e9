//! Interceptor drone marker and mission vector
//!
//! Unlike threat markers the drone is a singleton and moves: its marker is
//! created once and then repositioned in place on every poll. The mission
//! vector (origin -> target) is likewise created once and has its endpoints
//! updated whenever both are reported. A poll missing either endpoint leaves
//! the last drawn vector as it was.

use crate::types::{DroneState, GeoPoint};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MissionVector {
    pub origin: GeoPoint,
    pub target: GeoPoint,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DroneCommand {
    CreateMarker { position: GeoPoint },
    MoveMarker { position: GeoPoint },
    CreateVector(MissionVector),
    UpdateVector(MissionVector),
}

/// What is currently drawn for the drone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DroneTrack {
    marker: Option<GeoPoint>,
    vector: Option<MissionVector>,
}

impl DroneTrack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn marker(&self) -> Option<GeoPoint> {
        self.marker
    }

    pub fn vector(&self) -> Option<MissionVector> {
        self.vector
    }
}

/// Sync the drawn drone against the latest drone state
///
/// A state without a location is ignored entirely, vector included.
pub fn sync_drone(previous: DroneTrack, drone: &DroneState) -> (DroneTrack, Vec<DroneCommand>) {
    let Some(position) = drone.location else {
        return (previous, Vec::new());
    };

    let mut track = previous;
    let mut commands = Vec::with_capacity(2);

    commands.push(match track.marker {
        None => DroneCommand::CreateMarker { position },
        Some(_) => DroneCommand::MoveMarker { position },
    });
    track.marker = Some(position);

    if let (Some(origin), Some(target)) = (drone.origin_location, drone.target_location) {
        let vector = MissionVector { origin, target };
        commands.push(match track.vector {
            None => DroneCommand::CreateVector(vector),
            Some(_) => DroneCommand::UpdateVector(vector),
        });
        track.vector = Some(vector);
    }

    (track, commands)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drone_at(lat: f64, lon: f64) -> DroneState {
        DroneState {
            id: Some("demo-drone-1".to_string()),
            status: Some("idle".to_string()),
            location: Some(GeoPoint::new(lat, lon)),
            ..Default::default()
        }
    }

    #[test]
    fn test_marker_created_once_then_moved() {
        let (track, first) = sync_drone(DroneTrack::new(), &drone_at(28.5, 77.6));
        let (track, second) = sync_drone(track, &drone_at(28.51, 77.61));

        assert_eq!(first, vec![DroneCommand::CreateMarker { position: GeoPoint::new(28.5, 77.6) }]);
        assert_eq!(second, vec![DroneCommand::MoveMarker { position: GeoPoint::new(28.51, 77.61) }]);
        assert_eq!(track.marker(), Some(GeoPoint::new(28.51, 77.61)));
    }

    #[test]
    fn test_vector_created_then_updated() {
        let mut en_route = drone_at(28.5, 77.6);
        en_route.origin_location = Some(GeoPoint::new(28.5, 77.6));
        en_route.target_location = Some(GeoPoint::new(28.52, 77.58));

        let (track, first) = sync_drone(DroneTrack::new(), &en_route);
        assert!(matches!(first[1], DroneCommand::CreateVector(_)));

        en_route.target_location = Some(GeoPoint::new(28.5, 77.6));
        let (track, second) = sync_drone(track, &en_route);
        assert_eq!(
            second[1],
            DroneCommand::UpdateVector(MissionVector {
                origin: GeoPoint::new(28.5, 77.6),
                target: GeoPoint::new(28.5, 77.6),
            })
        );
        assert_eq!(track.vector().unwrap().target, GeoPoint::new(28.5, 77.6));
    }

    #[test]
    fn test_missing_endpoint_leaves_vector_untouched() {
        let mut en_route = drone_at(28.5, 77.6);
        en_route.origin_location = Some(GeoPoint::new(28.5, 77.6));
        en_route.target_location = Some(GeoPoint::new(28.52, 77.58));
        let (track, _) = sync_drone(DroneTrack::new(), &en_route);
        let drawn = track.vector();

        let (track, commands) = sync_drone(track, &drone_at(28.51, 77.59));

        assert_eq!(commands.len(), 1);
        assert_eq!(track.vector(), drawn);
    }

    #[test]
    fn test_state_without_location_is_ignored() {
        let (track, _) = sync_drone(DroneTrack::new(), &drone_at(28.5, 77.6));
        let lost = DroneState {
            origin_location: Some(GeoPoint::new(1.0, 1.0)),
            target_location: Some(GeoPoint::new(2.0, 2.0)),
            ..Default::default()
        };

        let (next, commands) = sync_drone(track.clone(), &lost);

        assert!(commands.is_empty());
        assert_eq!(next, track);
    }
}
