//! Feed poller
//!
//! Issues one fetch per feed on every tick (and once immediately at start),
//! each in its own task. Completions, successful or not, go to the state
//! task over a bounded channel. A failing or slow feed never holds up the
//! others, and a slow cycle is not cancelled when the next one starts: two
//! cycles may be in flight at once.

use crate::feeds::{DashboardApi, FeedKind, FeedUpdate};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Requests an out-of-band poll cycle
#[derive(Debug, Clone)]
pub struct RefreshTrigger {
    tx: mpsc::Sender<()>,
}

impl RefreshTrigger {
    /// Ask for an immediate full fetch set
    ///
    /// Returns false when the poller has stopped. A refresh already queued
    /// absorbs this one.
    pub fn refresh(&self) -> bool {
        match self.tx.try_send(()) {
            Ok(()) | Err(mpsc::error::TrySendError::Full(())) => true,
            Err(mpsc::error::TrySendError::Closed(())) => false,
        }
    }
}

/// Handle to a running poller. Dropping it stops the poller.
pub struct PollerHandle {
    shutdown: watch::Sender<bool>,
    trigger: RefreshTrigger,
    join: JoinHandle<u64>,
}

impl PollerHandle {
    pub fn trigger(&self) -> RefreshTrigger {
        self.trigger.clone()
    }

    pub fn refresh(&self) -> bool {
        self.trigger.refresh()
    }

    /// Stop scheduling new cycles. Fetches already in flight still complete
    /// and deliver their results.
    pub fn cancel(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Cancel and wait for the scheduling loop to exit; returns the number
    /// of cycles issued
    pub async fn stop(self) -> u64 {
        self.cancel();
        self.join.await.unwrap_or(0)
    }
}

/// Start polling every feed in [`FeedKind::ALL`] on `period`
pub fn spawn_poller(
    api: Arc<dyn DashboardApi>,
    period: Duration,
    updates: mpsc::Sender<FeedUpdate>,
) -> PollerHandle {
    spawn_poller_for(api, period, updates, FeedKind::ALL.to_vec())
}

/// Start polling a chosen set of feeds
pub fn spawn_poller_for(
    api: Arc<dyn DashboardApi>,
    period: Duration,
    updates: mpsc::Sender<FeedUpdate>,
    feeds: Vec<FeedKind>,
) -> PollerHandle {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (refresh_tx, refresh_rx) = mpsc::channel(1);

    let join = tokio::spawn(poll_loop(api, period, updates, feeds, shutdown_rx, refresh_rx));

    PollerHandle {
        shutdown: shutdown_tx,
        trigger: RefreshTrigger { tx: refresh_tx },
        join,
    }
}

async fn poll_loop(
    api: Arc<dyn DashboardApi>,
    period: Duration,
    updates: mpsc::Sender<FeedUpdate>,
    feeds: Vec<FeedKind>,
    mut shutdown: watch::Receiver<bool>,
    mut refresh: mpsc::Receiver<()>,
) -> u64 {
    log::info!("⏰ Starting poller ({} feeds, interval: {}ms)", feeds.len(), period.as_millis());

    // First tick completes immediately: that is the startup fetch
    let mut timer = interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut cycle = 0u64;

    loop {
        tokio::select! {
            biased;

            changed = shutdown.changed() => {
                // Err means the handle was dropped
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = timer.tick() => {
                cycle += 1;
                spawn_cycle(&api, &updates, &feeds, cycle);
            }
            Some(()) = refresh.recv() => {
                cycle += 1;
                log::debug!("🔄 Refresh requested, running cycle {}", cycle);
                spawn_cycle(&api, &updates, &feeds, cycle);
            }
        }
    }

    log::info!("⏹️  Poller stopped after {} cycles", cycle);
    cycle
}

fn spawn_cycle(
    api: &Arc<dyn DashboardApi>,
    updates: &mpsc::Sender<FeedUpdate>,
    feeds: &[FeedKind],
    cycle: u64,
) {
    for &feed in feeds {
        let api = api.clone();
        let updates = updates.clone();
        tokio::spawn(async move {
            let result = api.fetch(feed).await;
            if updates.send(FeedUpdate { feed, cycle, result }).await.is_err() {
                log::debug!("State task gone, dropping {} result (cycle {})", feed, cycle);
            }
        });
    }
}
