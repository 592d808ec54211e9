use {
    crate::{
        feeds::{FeedKind, FeedPayload, FeedUpdate},
        reconcile::{
            build_trend, detect_alerts, reconcile_markers, sync_drone, AlertedSet, DroneTrack,
            MarkerRegistry, TrendBucket,
        },
        sink::{RenderCommand, RenderSink},
        types::Entity,
        view::{self, Panel},
    },
    chrono::{DateTime, Utc},
    std::collections::HashMap,
    tokio::sync::mpsc,
};

/// Process-wide console state
///
/// Owned by exactly one task (see [`state_task`]); every feed completion is
/// applied here in arrival order, so nothing needs a lock.
pub struct DashboardState {
    markers: MarkerRegistry,
    alerted: AlertedSet,
    drone: DroneTrack,
    trend: Vec<TrendBucket>,
    /// Latest threats snapshot (kept for the trend, which is time-relative)
    threats: Vec<Entity>,
    /// Newest poll cycle applied per feed
    applied_cycles: HashMap<FeedKind, u64>,
    /// Clock used for the trend window (for testing with fixed time)
    now_fn: Box<dyn Fn() -> DateTime<Utc> + Send + Sync>,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::new_with_clock(Box::new(Utc::now))
    }

    /// Create state with a custom clock
    ///
    /// Used for testing with deterministic timestamps.
    pub fn new_with_clock(now_fn: Box<dyn Fn() -> DateTime<Utc> + Send + Sync>) -> Self {
        Self {
            markers: MarkerRegistry::new(),
            alerted: AlertedSet::new(),
            drone: DroneTrack::new(),
            trend: Vec::new(),
            threats: Vec::new(),
            applied_cycles: HashMap::new(),
            now_fn,
        }
    }

    pub fn markers(&self) -> &MarkerRegistry {
        &self.markers
    }

    pub fn alerted(&self) -> &AlertedSet {
        &self.alerted
    }

    pub fn drone(&self) -> &DroneTrack {
        &self.drone
    }

    pub fn trend(&self) -> &[TrendBucket] {
        &self.trend
    }

    pub fn threats(&self) -> &[Entity] {
        &self.threats
    }

    /// Apply one feed completion
    ///
    /// A failed fetch is logged and leaves every piece of state untouched.
    /// A completion from an older cycle than one already applied for the
    /// same feed is still applied (last arrival wins) but logged, since it
    /// means stale data just replaced fresher data.
    pub fn apply(&mut self, update: FeedUpdate) -> Vec<RenderCommand> {
        let FeedUpdate { feed, cycle, result } = update;

        let payload = match result {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("⚠️  {} fetch failed (cycle {}): {}", feed, cycle, e);
                return Vec::new();
            }
        };

        let newest = self.applied_cycles.entry(feed).or_insert(cycle);
        if cycle < *newest {
            log::warn!(
                "⚠️  {} response from cycle {} landed after cycle {}; applying stale snapshot",
                feed,
                cycle,
                *newest
            );
        } else {
            *newest = cycle;
        }

        self.apply_payload(payload)
    }

    /// Reconcile a decoded snapshot into state and return the render work
    pub fn apply_payload(&mut self, payload: FeedPayload) -> Vec<RenderCommand> {
        match payload {
            FeedPayload::Threats(threats) => self.apply_threats(threats),
            FeedPayload::Drone(drone) => {
                let (track, commands) = sync_drone(std::mem::take(&mut self.drone), &drone);
                self.drone = track;
                commands.into_iter().map(RenderCommand::Drone).collect()
            }
            FeedPayload::Ledger(entries) => panel(Panel::Ledger(view::ledger_tail(&entries))),
            FeedPayload::Incidents(items) => panel(Panel::Incidents(items)),
            FeedPayload::Commands(items) => panel(Panel::Commands(items)),
            FeedPayload::LedgerSummary(summary) => {
                panel(Panel::Integrity(view::integrity_badge(&summary)))
            }
            FeedPayload::Summary(summary) => panel(Panel::Summary(view::summary_panel(&summary))),
            FeedPayload::Mode(mode) => panel(Panel::Mode(view::mode_badge(&mode))),
            FeedPayload::Ros(ros) => panel(Panel::Ros(view::ros_panel(&ros))),
            FeedPayload::Whitelist(ids) => panel(Panel::Whitelist(ids)),
            FeedPayload::Risk(risk) => panel(Panel::Risk(view::risk_gauge(&risk))),
        }
    }

    fn apply_threats(&mut self, threats: Vec<Entity>) -> Vec<RenderCommand> {
        let now = (self.now_fn)();
        let mut commands = vec![RenderCommand::Panel(Panel::Threats(view::threat_rows(&threats)))];

        self.trend = build_trend(&threats, now);
        commands.push(RenderCommand::Trend(self.trend.clone()));

        let (alerted, alerts) = detect_alerts(std::mem::take(&mut self.alerted), &threats);
        self.alerted = alerted;
        commands.extend(alerts.into_iter().map(RenderCommand::Alert));

        let (markers, marker_commands) =
            reconcile_markers(std::mem::take(&mut self.markers), &threats);
        self.markers = markers;
        commands.extend(marker_commands.into_iter().map(RenderCommand::Marker));

        self.threats = threats;
        commands
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}

fn panel(panel: Panel) -> Vec<RenderCommand> {
    vec![RenderCommand::Panel(panel)]
}

/// Background task that receives feed completions and reconciles them into
/// state, forwarding the resulting render work to `sink`
///
/// Runs until every sender is dropped, then returns the final state.
pub async fn state_task<S: RenderSink>(
    mut receiver: mpsc::Receiver<FeedUpdate>,
    mut state: DashboardState,
    mut sink: S,
) -> DashboardState {
    log::info!("State task started");

    while let Some(update) = receiver.recv().await {
        for command in state.apply(update) {
            sink.render(&command);
        }
    }

    log::info!("State task stopped");
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::FeedError;
    use crate::reconcile::{DroneCommand, MarkerCommand};
    use crate::types::{DroneState, GeoPoint};
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 30).unwrap()
    }

    fn fixed_state() -> DashboardState {
        DashboardState::new_with_clock(Box::new(fixed_now))
    }

    fn quad(id: &str) -> Entity {
        Entity {
            id: id.to_string(),
            class: "quad".to_string(),
            confidence: 0.92,
            created_at: fixed_now(),
            location: Some(GeoPoint::new(1.0, 1.0)),
            status: None,
            remote_id: None,
            authorized: None,
        }
    }

    fn threats_update(cycle: u64, threats: Vec<Entity>) -> FeedUpdate {
        FeedUpdate {
            feed: FeedKind::Threats,
            cycle,
            result: Ok(FeedPayload::Threats(threats)),
        }
    }

    fn count<F: Fn(&RenderCommand) -> bool>(commands: &[RenderCommand], f: F) -> usize {
        commands.iter().filter(|c| f(c)).count()
    }

    fn is_create(c: &RenderCommand) -> bool {
        matches!(c, RenderCommand::Marker(MarkerCommand::Create { .. }))
    }

    fn is_alert(c: &RenderCommand) -> bool {
        matches!(c, RenderCommand::Alert(_))
    }

    #[test]
    fn test_single_threat_lifecycle() {
        let mut state = fixed_state();

        let first = state.apply(threats_update(1, vec![quad("a")]));
        assert_eq!(count(&first, is_create), 1);
        assert_eq!(count(&first, is_alert), 1);
        assert_eq!(state.markers().len(), 1);

        let second = state.apply(threats_update(2, vec![quad("a")]));
        assert_eq!(count(&second, is_create), 0);
        assert_eq!(count(&second, is_alert), 0);
        assert_eq!(state.markers().len(), 1);

        let third = state.apply(threats_update(3, vec![]));
        assert_eq!(
            count(&third, |c| matches!(c, RenderCommand::Marker(MarkerCommand::Remove { .. }))),
            1
        );
        assert!(state.markers().is_empty());
        assert!(state.trend().is_empty());
    }

    #[test]
    fn test_drone_polled_twice_moves_in_place() {
        let mut state = fixed_state();
        let at = |lat: f64| FeedPayload::Drone(DroneState {
            location: Some(GeoPoint::new(lat, 77.6)),
            ..Default::default()
        });

        let first = state.apply_payload(at(28.5));
        let second = state.apply_payload(at(28.6));

        assert!(matches!(first[0], RenderCommand::Drone(DroneCommand::CreateMarker { .. })));
        assert!(matches!(second[0], RenderCommand::Drone(DroneCommand::MoveMarker { .. })));
        assert_eq!(state.drone().marker(), Some(GeoPoint::new(28.6, 77.6)));
    }

    #[test]
    fn test_failed_fetch_keeps_previous_state() {
        let mut state = fixed_state();
        state.apply(threats_update(1, vec![quad("a")]));

        let commands = state.apply(FeedUpdate {
            feed: FeedKind::Threats,
            cycle: 2,
            result: Err(FeedError::Transport("connection refused".to_string())),
        });

        assert!(commands.is_empty());
        assert_eq!(state.markers().len(), 1);
        assert_eq!(state.threats().len(), 1);
    }

    #[test]
    fn test_stale_cycle_still_applied() {
        let mut state = fixed_state();
        state.apply(threats_update(5, vec![quad("a")]));

        state.apply(threats_update(4, vec![quad("b")]));

        assert!(state.markers().contains("b"));
        assert!(!state.markers().contains("a"));
    }

    #[test]
    fn test_threat_commands_order() {
        let mut state = fixed_state();
        let commands = state.apply(threats_update(1, vec![quad("a")]));

        assert!(matches!(commands[0], RenderCommand::Panel(Panel::Threats(_))));
        assert!(matches!(commands[1], RenderCommand::Trend(_)));
        assert!(is_alert(&commands[2]));
        assert!(is_create(&commands[3]));
    }

    #[tokio::test]
    async fn test_state_task_drains_channel() {
        let (tx, rx) = mpsc::channel(8);
        tx.send(threats_update(1, vec![quad("a"), quad("b")])).await.unwrap();
        drop(tx);

        let state = state_task(rx, fixed_state(), Vec::<RenderCommand>::new()).await;

        assert_eq!(state.markers().len(), 2);
        assert_eq!(state.alerted().len(), 2);
    }
}
