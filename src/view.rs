//! Panel view models derived from the pass-through feeds
//!
//! These are stateless projections: each one is rebuilt from the feed that
//! owns it whenever that feed delivers a new snapshot. Formatting helpers
//! follow the same rules as the list and badge widgets they feed.

use crate::types::{
    DashboardSummary, Entity, LedgerSummary, OpsMode, RiskComponents, RiskScore, RosSummary,
};
use serde_json::Value;

/// Ledger entries shown in the tail, newest first
pub const LEDGER_TAIL_LEN: usize = 40;

#[derive(Debug, Clone, PartialEq)]
pub struct ThreatRow {
    pub id: String,
    pub class: String,
    pub severity: &'static str,
    pub confidence_pct: u32,
    pub seen_at: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRow {
    pub short_id: String,
    pub event_type: String,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntegrityBadge {
    pub valid: bool,
    pub length: u64,
    pub window_valid: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassSlice {
    pub name: String,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryPanel {
    pub total_threats: u64,
    pub commands: u64,
    pub open_incidents: u64,
    pub ledger_events: u64,
    pub class_mix: Vec<ClassSlice>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModeBadge {
    pub mode: String,
    pub energy_delta_pct: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RosPanel {
    pub avoided_cost: f64,
    pub breach_reference: f64,
    pub ratio: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskBand {
    Secure,
    Moderate,
    Elevated,
    Critical,
}

impl RiskBand {
    pub fn from_score(score: f64) -> Self {
        if score > 70.0 {
            RiskBand::Critical
        } else if score > 40.0 {
            RiskBand::Elevated
        } else if score > 15.0 {
            RiskBand::Moderate
        } else {
            RiskBand::Secure
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskBand::Secure => "SECURE",
            RiskBand::Moderate => "MODERATE",
            RiskBand::Elevated => "ELEVATED",
            RiskBand::Critical => "CRITICAL",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskGauge {
    /// Score clamped to 0..=100
    pub score: f64,
    pub band: RiskBand,
    pub components: RiskComponents,
}

/// One refreshed panel, ready for the render sink
#[derive(Debug, Clone, PartialEq)]
pub enum Panel {
    Threats(Vec<ThreatRow>),
    Incidents(Vec<Value>),
    Commands(Vec<Value>),
    Ledger(Vec<LedgerRow>),
    Integrity(IntegrityBadge),
    Summary(SummaryPanel),
    Mode(ModeBadge),
    Ros(RosPanel),
    Whitelist(Vec<String>),
    Risk(RiskGauge),
}

pub fn threat_rows(threats: &[Entity]) -> Vec<ThreatRow> {
    threats
        .iter()
        .map(|t| ThreatRow {
            id: t.id.clone(),
            class: t.class.to_uppercase(),
            severity: t.severity().as_str(),
            confidence_pct: format_percent(t.confidence) as u32,
            seen_at: t.created_at.format("%H:%M:%S").to_string(),
        })
        .collect()
}

/// Last [`LEDGER_TAIL_LEN`] entries, newest first
pub fn ledger_tail(entries: &[Value]) -> Vec<LedgerRow> {
    let start = entries.len().saturating_sub(LEDGER_TAIL_LEN);
    entries[start..]
        .iter()
        .rev()
        .map(|entry| LedgerRow {
            short_id: shorten_id(&json_text(entry.get("id")).unwrap_or_default()),
            event_type: json_text(entry.get("event_type"))
                .unwrap_or_else(|| "event".to_string())
                .to_uppercase(),
            timestamp: json_text(entry.get("timestamp"))
                .or_else(|| json_text(entry.get("created_at")))
                .or_else(|| json_text(entry.pointer("/payload/timestamp"))),
        })
        .collect()
}

pub fn integrity_badge(summary: &LedgerSummary) -> IntegrityBadge {
    IntegrityBadge {
        valid: summary.valid.unwrap_or(false),
        length: summary.length,
        window_valid: summary.window_valid.unwrap_or(false),
    }
}

pub fn summary_panel(summary: &DashboardSummary) -> SummaryPanel {
    SummaryPanel {
        total_threats: summary.threat_count.unwrap_or(0),
        commands: summary.command_count.unwrap_or(0),
        open_incidents: summary.incidents_open.unwrap_or(0),
        ledger_events: summary.ledger_length.unwrap_or(0),
        class_mix: summary
            .class_distribution
            .iter()
            .map(|(name, value)| ClassSlice { name: name.clone(), value: *value })
            .collect(),
    }
}

pub fn mode_badge(mode: &OpsMode) -> ModeBadge {
    ModeBadge {
        mode: mode.mode.replacen('_', " ", 1),
        energy_delta_pct: format_percent(mode.simulated_energy_delta),
    }
}

pub fn ros_panel(ros: &RosSummary) -> RosPanel {
    RosPanel {
        avoided_cost: ros.avoided_cost_estimate,
        breach_reference: ros.single_breach_reference,
        ratio: format!("{:.2}", ros.ros_ratio),
    }
}

pub fn risk_gauge(risk: &RiskScore) -> RiskGauge {
    let score = risk.score.clamp(0.0, 100.0);
    RiskGauge {
        score,
        band: RiskBand::from_score(score),
        components: risk.components.clone(),
    }
}

/// Fraction to whole percent, rounded half away from zero
pub fn format_percent(fraction: f64) -> i64 {
    (fraction * 100.0).round() as i64
}

/// `first8...last4` for ids longer than 12 characters
pub fn shorten_id(id: &str) -> String {
    let chars: Vec<char> = id.chars().collect();
    if chars.len() <= 12 {
        return id.to_string();
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

fn json_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn test_risk_band_edges() {
        assert_eq!(RiskBand::from_score(15.0), RiskBand::Secure);
        assert_eq!(RiskBand::from_score(16.0), RiskBand::Moderate);
        assert_eq!(RiskBand::from_score(41.0), RiskBand::Elevated);
        assert_eq!(RiskBand::from_score(70.0), RiskBand::Elevated);
        assert_eq!(RiskBand::from_score(71.0), RiskBand::Critical);
    }

    #[test]
    fn test_risk_gauge_clamps_score() {
        let gauge = risk_gauge(&RiskScore { score: 140.0, components: Default::default() });
        assert_eq!(gauge.score, 100.0);
        assert_eq!(gauge.band, RiskBand::Critical);
    }

    #[test]
    fn test_ledger_tail_newest_first_and_bounded() {
        let entries: Vec<Value> = (1..=45)
            .map(|i| json!({"id": i, "event_type": "command_dispatch_drone",
                "payload": {"timestamp": format!("t{}", i)}}))
            .collect();

        let tail = ledger_tail(&entries);

        assert_eq!(tail.len(), LEDGER_TAIL_LEN);
        assert_eq!(tail[0].short_id, "45");
        assert_eq!(tail[0].event_type, "COMMAND_DISPATCH_DRONE");
        assert_eq!(tail[0].timestamp.as_deref(), Some("t45"));
        assert_eq!(tail[39].short_id, "6");
    }

    #[test]
    fn test_shorten_id() {
        assert_eq!(shorten_id("3f2a9c1e-77b0-4d1e-9a55-0c1f2e3d4b5a"), "3f2a9c1e...4b5a");
        assert_eq!(shorten_id("short"), "short");
    }

    #[test]
    fn test_summary_panel_defaults_missing_counters() {
        let mut class_distribution = BTreeMap::new();
        class_distribution.insert("bird".to_string(), 2);
        class_distribution.insert("consumer_quadcopter".to_string(), 5);
        let summary = DashboardSummary {
            threat_count: Some(7),
            class_distribution,
            ..Default::default()
        };

        let panel = summary_panel(&summary);

        assert_eq!(panel.total_threats, 7);
        assert_eq!(panel.open_incidents, 0);
        assert_eq!(panel.class_mix[0], ClassSlice { name: "bird".to_string(), value: 2 });
    }

    #[test]
    fn test_mode_badge_formatting() {
        let badge = mode_badge(&OpsMode {
            mode: "HIGH_ALERT".to_string(),
            simulated_energy_delta: -0.10,
            threats_recent_10m: Some(3),
        });
        assert_eq!(badge.mode, "HIGH ALERT");
        assert_eq!(badge.energy_delta_pct, -10);
    }
}
