//! Wire types for the polled feeds
//!
//! Everything here is produced by the backend and decoded as-is. Fields the
//! console never reads are left out; fields that the backend has renamed over
//! time are accepted under both names via `serde(alias)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Confidence at or above which a threat is rendered as high severity and
/// raises the alert cue.
pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.85;

/// Geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Severity bucket used for marker styling and the threat list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    High,
    Medium,
}

impl Severity {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= HIGH_CONFIDENCE_THRESHOLD {
            Severity::High
        } else {
            Severity::Medium
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "med",
        }
    }
}

/// A single airspace threat as returned by the threats feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub class: String,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
    /// `None` when the backend omitted the location or sent one without
    /// numeric coordinates.
    #[serde(default, deserialize_with = "lenient_point")]
    pub location: Option<GeoPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorized: Option<bool>,
}

impl Entity {
    pub fn severity(&self) -> Severity {
        Severity::from_confidence(self.confidence)
    }

    pub fn created_at_ms(&self) -> i64 {
        self.created_at.timestamp_millis()
    }
}

/// The interceptor drone. There is only ever one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DroneState {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_point")]
    pub location: Option<GeoPoint>,
    #[serde(default, deserialize_with = "lenient_point")]
    pub origin_location: Option<GeoPoint>,
    #[serde(default, deserialize_with = "lenient_point")]
    pub target_location: Option<GeoPoint>,
    #[serde(default)]
    pub current_threat_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskComponents {
    #[serde(default)]
    pub unauthorized_count: u32,
    #[serde(default)]
    pub max_confidence: f64,
    #[serde(default)]
    pub open_incidents: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskScore {
    pub score: f64,
    #[serde(default)]
    pub components: RiskComponents,
}

/// Aggregate counters from `/dashboard/summary`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    #[serde(default, alias = "total_threats")]
    pub threat_count: Option<u64>,
    #[serde(default)]
    pub command_count: Option<u64>,
    #[serde(default)]
    pub incidents_open: Option<u64>,
    #[serde(default)]
    pub ledger_length: Option<u64>,
    #[serde(default)]
    pub class_distribution: BTreeMap<String, u64>,
}

/// Chain integrity figures from `/ledger/summary`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerSummary {
    #[serde(default)]
    pub length: u64,
    #[serde(default, alias = "full_valid")]
    pub valid: Option<bool>,
    #[serde(default, alias = "recent_valid")]
    pub window_valid: Option<bool>,
    #[serde(default)]
    pub latest_chain_hash: Option<String>,
}

/// Adaptive operations mode from `/ops/mode`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpsMode {
    pub mode: String,
    #[serde(default)]
    pub simulated_energy_delta: f64,
    #[serde(default)]
    pub threats_recent_10m: Option<u64>,
}

/// Return-on-security figures from `/ros/summary`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RosSummary {
    #[serde(default)]
    pub avoided_cost_estimate: f64,
    #[serde(default)]
    pub single_breach_reference: f64,
    #[serde(default)]
    pub ros_ratio: f64,
}

/// Response body of `/evidence/bundle`
#[derive(Debug, Clone, Deserialize)]
pub struct EvidenceBundle {
    pub filename: String,
    pub base64: String,
    #[serde(default)]
    pub size_bytes: Option<u64>,
}

/// Accept any JSON for a location field and keep it only when it carries
/// numeric `lat` and `lon`. A single malformed location must not fail the
/// whole snapshot.
fn lenient_point<'de, D>(deserializer: D) -> Result<Option<GeoPoint>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| serde_json::from_value::<GeoPoint>(value).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_decodes_backend_shape() {
        let value = json!({
            "id": "8b1c",
            "class": "consumer_quadcopter",
            "confidence": 0.91,
            "location": {"lat": 28.501, "lon": 77.603},
            "status": "detected",
            "created_at": "2024-05-01T12:00:05.123456Z",
            "remote_id": "RID-ab12cd",
            "authorized": false
        });

        let entity: Entity = serde_json::from_value(value).unwrap();
        assert_eq!(entity.id, "8b1c");
        assert_eq!(entity.location, Some(GeoPoint::new(28.501, 77.603)));
        assert_eq!(entity.severity(), Severity::High);
        assert_eq!(entity.authorized, Some(false));
    }

    #[test]
    fn test_malformed_location_is_dropped_not_fatal() {
        let value = json!([
            {"id": "a", "class": "bird", "confidence": 0.2,
             "created_at": "2024-05-01T12:00:00Z", "location": {"lat": "north"}},
            {"id": "b", "class": "bird", "confidence": 0.2,
             "created_at": "2024-05-01T12:00:00Z", "location": null},
            {"id": "c", "class": "bird", "confidence": 0.2,
             "created_at": "2024-05-01T12:00:00Z"}
        ]);

        let entities: Vec<Entity> = serde_json::from_value(value).unwrap();
        assert_eq!(entities.len(), 3);
        assert!(entities.iter().all(|e| e.location.is_none()));
    }

    #[test]
    fn test_severity_threshold_is_inclusive() {
        assert_eq!(Severity::from_confidence(0.85), Severity::High);
        assert_eq!(Severity::from_confidence(0.849), Severity::Medium);
    }

    #[test]
    fn test_ledger_summary_accepts_both_field_names() {
        let current: LedgerSummary =
            serde_json::from_value(json!({"length": 4, "full_valid": true, "recent_valid": false}))
                .unwrap();
        let legacy: LedgerSummary =
            serde_json::from_value(json!({"length": 4, "valid": true, "window_valid": false}))
                .unwrap();

        assert_eq!(current, legacy);
        assert_eq!(current.valid, Some(true));
        assert_eq!(current.window_valid, Some(false));
    }
}
