//! Feed catalogue and transport seam
//!
//! Every logical feed is a read-only GET returning a full snapshot. The
//! transport is abstracted behind [`DashboardApi`] so the poller and the
//! operator actions can be driven by an in-memory fake in tests.

pub mod http;

use crate::types::{
    DashboardSummary, DroneState, Entity, LedgerSummary, OpsMode, RiskScore, RosSummary,
};
use async_trait::async_trait;
use serde_json::Value;

pub use http::HttpDashboardApi;

/// The polled feeds, one fetch each per cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeedKind {
    Threats,
    Ledger,
    Incidents,
    Commands,
    LedgerSummary,
    Summary,
    Mode,
    Ros,
    Drone,
    Whitelist,
    Risk,
}

impl FeedKind {
    pub const ALL: [FeedKind; 11] = [
        FeedKind::Threats,
        FeedKind::Ledger,
        FeedKind::Incidents,
        FeedKind::Commands,
        FeedKind::LedgerSummary,
        FeedKind::Summary,
        FeedKind::Mode,
        FeedKind::Ros,
        FeedKind::Drone,
        FeedKind::Whitelist,
        FeedKind::Risk,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedKind::Threats => "threats",
            FeedKind::Ledger => "ledger",
            FeedKind::Incidents => "incidents",
            FeedKind::Commands => "commands",
            FeedKind::LedgerSummary => "ledger_summary",
            FeedKind::Summary => "summary",
            FeedKind::Mode => "mode",
            FeedKind::Ros => "ros",
            FeedKind::Drone => "drone",
            FeedKind::Whitelist => "whitelist",
            FeedKind::Risk => "risk",
        }
    }

    /// Path relative to the API base
    pub fn path(&self) -> &'static str {
        match self {
            FeedKind::Threats => "/threats/",
            FeedKind::Ledger => "/ledger/all",
            FeedKind::Incidents => "/incidents/",
            FeedKind::Commands => "/commands/log",
            FeedKind::LedgerSummary => "/ledger/summary",
            FeedKind::Summary => "/dashboard/summary",
            FeedKind::Mode => "/ops/mode",
            FeedKind::Ros => "/ros/summary",
            FeedKind::Drone => "/commands/drone",
            FeedKind::Whitelist => "/airspace/whitelist",
            FeedKind::Risk => "/risk/score",
        }
    }
}

impl std::fmt::Display for FeedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded snapshot of one feed
#[derive(Debug, Clone, PartialEq)]
pub enum FeedPayload {
    Threats(Vec<Entity>),
    Ledger(Vec<Value>),
    Incidents(Vec<Value>),
    Commands(Vec<Value>),
    LedgerSummary(LedgerSummary),
    Summary(DashboardSummary),
    Mode(OpsMode),
    Ros(RosSummary),
    Drone(DroneState),
    Whitelist(Vec<String>),
    Risk(RiskScore),
}

impl FeedPayload {
    /// Decode a raw JSON body according to the feed it was fetched from
    pub fn decode(feed: FeedKind, body: Value) -> Result<Self, FeedError> {
        fn typed<T: serde::de::DeserializeOwned>(
            feed: FeedKind,
            body: Value,
        ) -> Result<T, FeedError> {
            serde_json::from_value(body).map_err(|e| FeedError::Decode {
                feed: feed.as_str(),
                message: e.to_string(),
            })
        }

        Ok(match feed {
            FeedKind::Threats => FeedPayload::Threats(typed(feed, body)?),
            FeedKind::Ledger => FeedPayload::Ledger(typed(feed, body)?),
            FeedKind::Incidents => FeedPayload::Incidents(typed(feed, body)?),
            FeedKind::Commands => FeedPayload::Commands(typed(feed, body)?),
            FeedKind::LedgerSummary => FeedPayload::LedgerSummary(typed(feed, body)?),
            FeedKind::Summary => FeedPayload::Summary(typed(feed, body)?),
            FeedKind::Mode => FeedPayload::Mode(typed(feed, body)?),
            FeedKind::Ros => FeedPayload::Ros(typed(feed, body)?),
            FeedKind::Drone => FeedPayload::Drone(typed(feed, body)?),
            FeedKind::Whitelist => FeedPayload::Whitelist(typed(feed, body)?),
            FeedKind::Risk => FeedPayload::Risk(typed(feed, body)?),
        })
    }

    pub fn kind(&self) -> FeedKind {
        match self {
            FeedPayload::Threats(_) => FeedKind::Threats,
            FeedPayload::Ledger(_) => FeedKind::Ledger,
            FeedPayload::Incidents(_) => FeedKind::Incidents,
            FeedPayload::Commands(_) => FeedKind::Commands,
            FeedPayload::LedgerSummary(_) => FeedKind::LedgerSummary,
            FeedPayload::Summary(_) => FeedKind::Summary,
            FeedPayload::Mode(_) => FeedKind::Mode,
            FeedPayload::Ros(_) => FeedKind::Ros,
            FeedPayload::Drone(_) => FeedKind::Drone,
            FeedPayload::Whitelist(_) => FeedKind::Whitelist,
            FeedPayload::Risk(_) => FeedKind::Risk,
        }
    }
}

/// One completed fetch, successful or not, tagged with the poll cycle that
/// issued it
#[derive(Debug)]
pub struct FeedUpdate {
    pub feed: FeedKind,
    pub cycle: u64,
    pub result: Result<FeedPayload, FeedError>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedError {
    /// Connection, timeout or body read failure
    Transport(String),
    /// Non-success HTTP status
    Status { path: String, status: u16 },
    /// Body was JSON but not the expected shape
    Decode { feed: &'static str, message: String },
}

impl std::fmt::Display for FeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedError::Transport(msg) => write!(f, "transport error: {}", msg),
            FeedError::Status { path, status } => write!(f, "HTTP {} from {}", status, path),
            FeedError::Decode { feed, message } => {
                write!(f, "could not decode {} feed: {}", feed, message)
            }
        }
    }
}

impl std::error::Error for FeedError {}

impl From<reqwest::Error> for FeedError {
    fn from(e: reqwest::Error) -> Self {
        FeedError::Transport(e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiMethod {
    Get,
    Post,
    Delete,
}

/// A write (or one-shot read) issued by an operator action
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: ApiMethod,
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self { method: ApiMethod::Get, path: path.into(), body: None }
    }

    pub fn post(path: impl Into<String>, body: Option<Value>) -> Self {
        Self { method: ApiMethod::Post, path: path.into(), body }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self { method: ApiMethod::Delete, path: path.into(), body: None }
    }
}

/// Transport used by the poller and the operator actions
#[async_trait]
pub trait DashboardApi: Send + Sync {
    /// Fetch and decode the current snapshot of one feed
    async fn fetch(&self, feed: FeedKind) -> Result<FeedPayload, FeedError>;

    /// Issue an operator request and return the response body
    /// (`Value::Null` when the body is empty)
    async fn send(&self, request: &ApiRequest) -> Result<Value, FeedError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_every_feed_has_distinct_path() {
        let mut paths: Vec<&str> = FeedKind::ALL.iter().map(|f| f.path()).collect();
        paths.sort_unstable();
        paths.dedup();
        assert_eq!(paths.len(), FeedKind::ALL.len());
    }

    #[test]
    fn test_decode_matches_feed_kind() {
        let payload = FeedPayload::decode(
            FeedKind::Risk,
            json!({"score": 62, "components": {"unauthorized_count": 3,
                "max_confidence": 0.93, "open_incidents": 1}}),
        )
        .unwrap();

        assert_eq!(payload.kind(), FeedKind::Risk);
        match payload {
            FeedPayload::Risk(risk) => {
                assert_eq!(risk.score, 62.0);
                assert_eq!(risk.components.unauthorized_count, 3);
            }
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn test_decode_error_names_feed() {
        let err = FeedPayload::decode(FeedKind::Whitelist, json!({"not": "a list"})).unwrap_err();
        match err {
            FeedError::Decode { feed, .. } => assert_eq!(feed, "whitelist"),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
