//! Periodic tier scans and cache maintenance.
//!
//! Each tier gets its own task ticking at the tier's cadence, so a slow
//! tier (rate-limit waits) never delays the others.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info};

use breakout_core::universe::Tier;

use crate::main_lib::{log_usage, AppState};

/// Expired cache entries are dropped this often.
const PURGE_INTERVAL_SECS: u64 = 60 * 60;

/// Starts one scan task per tier and the cache purge task.
pub fn start(state: Arc<AppState>) -> Vec<JoinHandle<()>> {
    let mut handles: Vec<JoinHandle<()>> = state
        .tiers
        .iter()
        .cloned()
        .map(|tier| spawn_tier(state.clone(), tier))
        .collect();
    handles.push(spawn_purge(state));
    handles
}

fn spawn_tier(state: Arc<AppState>, tier: Tier) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "[{}] Scheduler started: {} symbols at {} every {}s",
            tier.name,
            tier.symbols.len(),
            tier.interval,
            tier.cadence().as_secs()
        );

        // First tick is immediate.
        let mut ticker = interval(tier.cadence());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            run_cycle(&state, &tier).await;
        }
    })
}

async fn run_cycle(state: &Arc<AppState>, tier: &Tier) {
    match state.scanner.scan_tier(tier).await {
        Ok(report) if report.budget_exhausted() => log_usage(state),
        Ok(report) => debug!("[{}] cycle done, {} signals", tier.name, report.signals.len()),
        Err(e) => error!("[{}] Scan failed: {}", tier.name, e),
    }
}

fn spawn_purge(state: Arc<AppState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(PURGE_INTERVAL_SECS));
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let purged = state.fetcher.purge_expired();
            let stats = state.fetcher.stats();
            info!(
                "Cache maintenance: purged {} expired entries ({} hits, {} misses)",
                purged, stats.cache_hits, stats.cache_misses
            );
            log_usage(&state);
        }
    })
}
