//! Kavach console runtime
//!
//! Wires the poller, the state task and the log sink together, then reads
//! operator commands from stdin until CTRL+C or `quit`.
//!
//! Usage:
//!   cargo run --release --bin kavach_console
//!
//! Environment variables:
//!   KAVACH_API_BASE - API root (default: http://127.0.0.1:8000/api)
//!   POLL_INTERVAL_MS - Poll interval (default: 6000)
//!   REQUEST_TIMEOUT_MS - Per-request timeout (default: 10000)
//!   EVIDENCE_DIR - Where evidence bundles are written (default: .)

use dotenv::dotenv;
use kavach_console::{
    actions::{parse_console_command, ActionRunner, ConsoleCommand},
    feeds::{DashboardApi, FeedUpdate, HttpDashboardApi},
    poller::spawn_poller,
    sink::LogRenderSink,
    state::{state_task, DashboardState},
    DashboardConfig,
};
use log::{error, info, warn};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    // Write logs to stderr; stdin stays free for operator commands
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    info!("🛡️  Starting Kavach console...");

    let config = DashboardConfig::from_env()?;

    info!("📊 Configuration:");
    info!("   ├─ API base: {}", config.api_base);
    info!("   ├─ Poll interval: {}ms", config.poll_interval_ms);
    info!("   ├─ Request timeout: {}ms", config.request_timeout_ms);
    info!("   ├─ Channel buffer: {} updates", config.channel_buffer);
    info!("   └─ Evidence dir: {}", config.evidence_dir.display());

    let api: Arc<dyn DashboardApi> =
        Arc::new(HttpDashboardApi::new(&config.api_base, config.request_timeout())?);

    let (tx, rx) = mpsc::channel::<FeedUpdate>(config.channel_buffer);

    let state_handle = tokio::spawn(state_task(rx, DashboardState::new(), LogRenderSink));
    info!("✅ State task spawned");

    let poller = spawn_poller(api.clone(), config.poll_interval(), tx);
    info!("✅ Poller spawned");

    let actions = ActionRunner::new(api, poller.trigger(), config.evidence_dir.clone());

    info!("");
    info!("⌨️  Commands: seed [n] | rtb | hold | dispatch <cmd> [threat_id] | wl add <rid> | wl rm <rid> | tamper | export | refresh | quit");
    info!("🔄 Press CTRL+C to shutdown gracefully");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                match signal {
                    Ok(()) => info!("⚠️  Received CTRL+C, shutting down..."),
                    Err(err) => error!("❌ Failed to listen for CTRL+C: {}", err),
                }
                break;
            }
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    // stdin closed: keep polling until CTRL+C
                    Ok(None) => {
                        let _ = tokio::signal::ctrl_c().await;
                        info!("⚠️  Received CTRL+C, shutting down...");
                        break;
                    }
                    Err(e) => {
                        warn!("⚠️  Failed to read stdin: {}", e);
                        continue;
                    }
                };

                if line.trim().is_empty() {
                    continue;
                }

                match parse_console_command(&line, config.seed_count) {
                    Some(ConsoleCommand::Action(action)) => {
                        actions.perform(action).await;
                    }
                    Some(ConsoleCommand::Refresh) => {
                        poller.refresh();
                    }
                    Some(ConsoleCommand::Quit) => break,
                    None => warn!("⚠️  Unknown command: {}", line.trim()),
                }
            }
        }
    }

    let cycles = poller.stop().await;

    // In-flight fetches finish within the request timeout, then the channel
    // closes and the state task returns
    match state_handle.await {
        Ok(state) => info!(
            "✅ Console stopped after {} cycles ({} markers live, {} alerts raised)",
            cycles,
            state.markers().len(),
            state.alerted().len()
        ),
        Err(e) => error!("❌ State task failed: {}", e),
    }

    Ok(())
}
