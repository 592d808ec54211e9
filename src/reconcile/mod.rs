//! # Live-state reconciliation
//!
//! Turns repeated full-snapshot polls into incremental render work.
//!
//! Every function here is pure in the same shape: it takes the previous
//! state by value plus the new snapshot, and returns the next state together
//! with the commands the renderer must apply. No I/O, no clocks (the trend
//! takes `now` as an argument).
//!
//! ## Module Organization
//!
//! - `markers` - keyed threat markers (create/remove, position frozen at creation)
//! - `trend` - per-minute trend over a 15-minute look-back, rebuilt every poll
//! - `alerts` - once-per-id alert cue for confidence >= 0.85
//! - `drone` - singleton drone marker and mission vector, updated in place

pub mod alerts;
pub mod drone;
pub mod markers;
pub mod trend;

pub use alerts::{detect_alerts, AlertEvent, AlertedSet, ALERT_THRESHOLD};
pub use drone::{sync_drone, DroneCommand, DroneTrack, MissionVector};
pub use markers::{reconcile_markers, MarkerCommand, MarkerRegistry, ThreatMarker};
pub use trend::{build_trend, TrendBucket, BUCKET_WIDTH_MS, TREND_WINDOW_MS};
