//! Render sink seam
//!
//! The console core never draws anything. It hands [`RenderCommand`]s to a
//! [`RenderSink`]; whatever sits behind the sink (map widget, chart, list,
//! audio cue) is an external collaborator. The only sink shipped here writes
//! to the log.

use crate::reconcile::{AlertEvent, DroneCommand, MarkerCommand, TrendBucket};
use crate::types::GeoPoint;
use crate::view::Panel;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    Marker(MarkerCommand),
    Drone(DroneCommand),
    Alert(AlertEvent),
    /// Replace the whole trend series
    Trend(Vec<TrendBucket>),
    Panel(Panel),
}

pub trait RenderSink: Send {
    fn render(&mut self, command: &RenderCommand);
}

/// Collects commands in memory
impl RenderSink for Vec<RenderCommand> {
    fn render(&mut self, command: &RenderCommand) {
        self.push(command.clone());
    }
}

/// Forwards commands to another task; a closed receiver drops them silently
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<RenderCommand>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<RenderCommand>) -> Self {
        Self { tx }
    }
}

impl RenderSink for ChannelSink {
    fn render(&mut self, command: &RenderCommand) {
        let _ = self.tx.send(command.clone());
    }
}

/// Writes every command to the log at info level (alerts at warn)
#[derive(Debug, Default)]
pub struct LogRenderSink;

impl RenderSink for LogRenderSink {
    fn render(&mut self, command: &RenderCommand) {
        match command {
            RenderCommand::Marker(MarkerCommand::Create { id, marker }) => {
                log::info!(
                    "📍 Marker + {} {} at {} [{}]",
                    id,
                    marker.label,
                    format_position(&marker.position),
                    marker.severity.as_str()
                );
            }
            RenderCommand::Marker(MarkerCommand::Remove { id }) => {
                log::info!("📍 Marker - {}", id);
            }
            RenderCommand::Drone(DroneCommand::CreateMarker { position }) => {
                log::info!("🚁 Drone marker at {}", format_position(position));
            }
            RenderCommand::Drone(DroneCommand::MoveMarker { position }) => {
                log::debug!("🚁 Drone moved to {}", format_position(position));
            }
            RenderCommand::Drone(DroneCommand::CreateVector(v))
            | RenderCommand::Drone(DroneCommand::UpdateVector(v)) => {
                log::info!(
                    "🧭 Mission vector {} -> {}",
                    format_position(&v.origin),
                    format_position(&v.target)
                );
            }
            RenderCommand::Alert(alert) => {
                log::warn!(
                    "🚨 HIGH CONFIDENCE {} {} ({}%)",
                    alert.class.to_uppercase(),
                    alert.id,
                    crate::view::format_percent(alert.confidence)
                );
            }
            RenderCommand::Trend(buckets) => {
                let series: Vec<String> =
                    buckets.iter().map(|b| format!("{}={}", b.label, b.total)).collect();
                log::info!("📈 Trend (15m): [{}]", series.join(", "));
            }
            RenderCommand::Panel(panel) => log_panel(panel),
        }
    }
}

fn log_panel(panel: &Panel) {
    match panel {
        Panel::Threats(rows) => log::info!("🎯 Active threats: {}", rows.len()),
        Panel::Incidents(items) => log::info!("🚨 Incidents: {}", items.len()),
        Panel::Commands(items) => log::info!("🎮 Commands: {}", items.len()),
        Panel::Ledger(rows) => match rows.first() {
            Some(latest) => log::info!("🔗 Ledger tail: {} (latest {} {})", rows.len(), latest.event_type, latest.short_id),
            None => log::info!("🔗 Ledger tail: empty"),
        },
        Panel::Integrity(badge) => {
            if badge.valid {
                log::info!("🛡️  Ledger integrity verified ({} events)", badge.length);
            } else {
                log::warn!("⚠️  Ledger anomaly detected ({} events, window ok: {})", badge.length, badge.window_valid);
            }
        }
        Panel::Summary(s) => log::info!(
            "📊 Threats {} | Commands {} | Open incidents {} | Ledger {}",
            s.total_threats,
            s.commands,
            s.open_incidents,
            s.ledger_events
        ),
        Panel::Mode(m) => log::info!("⚡ Mode {} ({}% energy delta)", m.mode, m.energy_delta_pct),
        Panel::Ros(r) => log::info!(
            "💰 Avoided ${:.0} | Ref breach ${:.0} | ROS {}",
            r.avoided_cost,
            r.breach_reference,
            r.ratio
        ),
        Panel::Whitelist(ids) => log::info!("✅ Whitelist: {} authorized", ids.len()),
        Panel::Risk(g) => log::info!(
            "🎚️  Risk {:.0} {} (unauth {}, max conf {}%, inc {})",
            g.score,
            g.band.as_str(),
            g.components.unauthorized_count,
            crate::view::format_percent(g.components.max_confidence),
            g.components.open_incidents
        ),
    }
}

/// Format a position for display
pub fn format_position(p: &GeoPoint) -> String {
    format!("({:.5}, {:.5})", p.lat, p.lon)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_position() {
        assert_eq!(format_position(&GeoPoint::new(28.5, 77.6)), "(28.50000, 77.60000)");
    }

    #[test]
    fn test_vec_sink_records_in_order() {
        let mut sink: Vec<RenderCommand> = Vec::new();
        sink.render(&RenderCommand::Trend(Vec::new()));
        sink.render(&RenderCommand::Marker(MarkerCommand::Remove { id: "a".to_string() }));

        assert_eq!(sink.len(), 2);
        assert!(matches!(sink[1], RenderCommand::Marker(MarkerCommand::Remove { .. })));
    }
}
