//! Operator actions
//!
//! Writes against the backend are fire-and-forget from the console's point of
//! view: a failure is logged and swallowed, a success triggers an immediate
//! poll of every feed so the resulting state changes show up without waiting
//! for the next tick.
//!
//! Evidence export is the one read-only action: it downloads the bundle,
//! decodes it and writes the zip to the evidence directory.

use crate::feeds::{ApiRequest, DashboardApi, FeedError};
use crate::poller::RefreshTrigger;
use crate::types::{EvidenceBundle, GeoPoint};
use base64::Engine;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Drone commands the console can dispatch
pub const RETURN_TO_BASE: &str = "return_to_base";
pub const HOLD_POSITION: &str = "hold_position";

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchCommand {
    pub command: String,
    pub threat_id: Option<String>,
    pub coordinates: Option<GeoPoint>,
}

impl DispatchCommand {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            threat_id: None,
            coordinates: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OperatorAction {
    SeedScenario { count: u32 },
    Dispatch(DispatchCommand),
    WhitelistAdd { remote_id: String },
    WhitelistRemove { remote_id: String },
    CorruptLedger,
    ExportEvidence,
}

impl OperatorAction {
    pub fn name(&self) -> &'static str {
        match self {
            OperatorAction::SeedScenario { .. } => "seed_scenario",
            OperatorAction::Dispatch(_) => "dispatch_command",
            OperatorAction::WhitelistAdd { .. } => "whitelist_add",
            OperatorAction::WhitelistRemove { .. } => "whitelist_remove",
            OperatorAction::CorruptLedger => "ledger_corrupt",
            OperatorAction::ExportEvidence => "evidence_export",
        }
    }

    /// Whether success should be followed by a full poll
    pub fn mutates(&self) -> bool {
        !matches!(self, OperatorAction::ExportEvidence)
    }

    pub fn request(&self) -> ApiRequest {
        match self {
            OperatorAction::SeedScenario { count } => {
                ApiRequest::post("/threats/seed", Some(json!({ "count": count })))
            }
            OperatorAction::Dispatch(cmd) => {
                let mut body = json!({ "command": cmd.command });
                if let Some(threat_id) = &cmd.threat_id {
                    body["threat_id"] = json!(threat_id);
                }
                if let Some(p) = cmd.coordinates {
                    body["coordinates"] = json!({ "lat": p.lat, "lon": p.lon });
                }
                ApiRequest::post("/commands/dispatch", Some(body))
            }
            OperatorAction::WhitelistAdd { remote_id } => {
                ApiRequest::post("/airspace/whitelist", Some(json!({ "remote_id": remote_id })))
            }
            OperatorAction::WhitelistRemove { remote_id } => {
                ApiRequest::delete(format!("/airspace/whitelist/{}", remote_id))
            }
            OperatorAction::CorruptLedger => ApiRequest::post("/ledger/corrupt", None),
            OperatorAction::ExportEvidence => ApiRequest::get("/evidence/bundle"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Completed,
    Exported(PathBuf),
    Failed,
}

#[derive(Debug)]
pub enum ExportError {
    Fetch(FeedError),
    Shape(serde_json::Error),
    Decode(base64::DecodeError),
    InvalidFilename(String),
    Io(std::io::Error),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Fetch(e) => write!(f, "bundle fetch failed: {}", e),
            ExportError::Shape(e) => write!(f, "unexpected bundle shape: {}", e),
            ExportError::Decode(e) => write!(f, "bundle is not valid base64: {}", e),
            ExportError::InvalidFilename(name) => write!(f, "unusable bundle filename: {:?}", name),
            ExportError::Io(e) => write!(f, "could not write bundle: {}", e),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<FeedError> for ExportError {
    fn from(e: FeedError) -> Self {
        ExportError::Fetch(e)
    }
}

impl From<std::io::Error> for ExportError {
    fn from(e: std::io::Error) -> Self {
        ExportError::Io(e)
    }
}

/// Runs operator actions against the backend
pub struct ActionRunner {
    api: Arc<dyn DashboardApi>,
    refresh: RefreshTrigger,
    evidence_dir: PathBuf,
}

impl ActionRunner {
    pub fn new(api: Arc<dyn DashboardApi>, refresh: RefreshTrigger, evidence_dir: PathBuf) -> Self {
        Self {
            api,
            refresh,
            evidence_dir,
        }
    }

    /// Perform `action`; never returns an error
    pub async fn perform(&self, action: OperatorAction) -> ActionOutcome {
        if action == OperatorAction::ExportEvidence {
            return match self.export_evidence().await {
                Ok(path) => {
                    log::info!("📦 Evidence bundle written to {}", path.display());
                    ActionOutcome::Exported(path)
                }
                Err(e) => {
                    log::error!("❌ Evidence export failed: {}", e);
                    ActionOutcome::Failed
                }
            };
        }

        match self.api.send(&action.request()).await {
            Ok(reply) => {
                log::info!("✅ {} accepted{}", action.name(), describe_reply(&reply));
                if action.mutates() && !self.refresh.refresh() {
                    log::warn!("⚠️  Poller stopped; {} result will not be picked up", action.name());
                }
                ActionOutcome::Completed
            }
            Err(e) => {
                log::error!("❌ {} failed: {}", action.name(), e);
                ActionOutcome::Failed
            }
        }
    }

    async fn export_evidence(&self) -> Result<PathBuf, ExportError> {
        let reply = self.api.send(&OperatorAction::ExportEvidence.request()).await?;
        let bundle: EvidenceBundle = serde_json::from_value(reply).map_err(ExportError::Shape)?;

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(bundle.base64.as_bytes())
            .map_err(ExportError::Decode)?;

        if let Some(expected) = bundle.size_bytes {
            if expected != bytes.len() as u64 {
                log::warn!(
                    "⚠️  Evidence bundle size mismatch: header says {} bytes, decoded {}",
                    expected,
                    bytes.len()
                );
            }
        }

        let filename = Path::new(&bundle.filename)
            .file_name()
            .ok_or_else(|| ExportError::InvalidFilename(bundle.filename.clone()))?;
        let path = self.evidence_dir.join(filename);

        tokio::fs::create_dir_all(&self.evidence_dir).await?;
        tokio::fs::write(&path, &bytes).await?;
        Ok(path)
    }
}

fn describe_reply(reply: &Value) -> String {
    match reply {
        Value::Object(map) if map.contains_key("total") => format!(" (total: {})", map["total"]),
        _ => String::new(),
    }
}

/// A line typed at the operator console
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Action(OperatorAction),
    Refresh,
    Quit,
}

/// Parse one console line
///
/// ```text
/// seed [count]          generate a threat scenario
/// rtb | hold            return drone to base / hold position
/// dispatch <cmd> [threat_id]
/// wl add <rid> | wl rm <rid>
/// tamper                corrupt one ledger entry
/// export                download the evidence bundle
/// refresh | quit
/// ```
pub fn parse_console_command(line: &str, default_seed_count: u32) -> Option<ConsoleCommand> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let action = match words.as_slice() {
        ["seed"] => OperatorAction::SeedScenario { count: default_seed_count },
        ["seed", n] => OperatorAction::SeedScenario { count: n.parse().ok()? },
        ["rtb"] => OperatorAction::Dispatch(DispatchCommand::new(RETURN_TO_BASE)),
        ["hold"] => OperatorAction::Dispatch(DispatchCommand::new(HOLD_POSITION)),
        ["dispatch", cmd] => OperatorAction::Dispatch(DispatchCommand::new(*cmd)),
        ["dispatch", cmd, threat_id] => OperatorAction::Dispatch(DispatchCommand {
            threat_id: Some(threat_id.to_string()),
            ..DispatchCommand::new(*cmd)
        }),
        ["wl", "add", rid] => OperatorAction::WhitelistAdd { remote_id: rid.to_string() },
        ["wl", "rm", rid] => OperatorAction::WhitelistRemove { remote_id: rid.to_string() },
        ["tamper"] => OperatorAction::CorruptLedger,
        ["export"] => OperatorAction::ExportEvidence,
        ["refresh"] => return Some(ConsoleCommand::Refresh),
        ["quit"] | ["exit"] => return Some(ConsoleCommand::Quit),
        _ => return None,
    };
    Some(ConsoleCommand::Action(action))
}
