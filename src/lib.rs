//! # Kavach live-state console
//!
//! Polls the airspace-defence backend's feeds (threats, drone, risk, ledger
//! and friends) and reconciles every snapshot into render work:
//!
//! - threat markers maintained incrementally by entity id
//! - a per-minute threat trend over a 15-minute look-back
//! - a once-per-id alert cue for high-confidence threats
//! - the interceptor drone's marker and mission vector, moved in place
//!
//! ## Architecture
//!
//! ```text
//! poller (one task per feed per cycle)
//!     ↓ mpsc<FeedUpdate>
//! state::state_task (sole owner of DashboardState)
//!     ↓ reconcile::* (pure)
//! RenderSink (external)
//! ```
//!
//! ## Module Organization
//!
//! - `config` - environment-driven configuration
//! - `types` - wire types of the polled feeds
//! - `feeds` - feed catalogue, `DashboardApi` seam, reqwest transport
//! - `reconcile` - markers, trend, alerts, drone
//! - `view` - panel view models for the pass-through feeds
//! - `state` - owned console state and the task that applies updates
//! - `poller` - cancellable repeating fetch scheduler
//! - `actions` - operator writes and evidence export
//! - `sink` - render command type and sinks

pub mod actions;
pub mod config;
pub mod feeds;
pub mod poller;
pub mod reconcile;
pub mod sink;
pub mod state;
pub mod types;
pub mod view;

pub use config::DashboardConfig;
pub use feeds::{DashboardApi, FeedKind, FeedPayload, FeedUpdate, HttpDashboardApi};
pub use poller::{spawn_poller, PollerHandle, RefreshTrigger};
pub use sink::{LogRenderSink, RenderCommand, RenderSink};
pub use state::{state_task, DashboardState};
