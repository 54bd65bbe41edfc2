//! Periodic ingest summary logging.

use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::sync::watch;
use tracing::info;

use crate::ingest::Hub;

/// Log a summary of pipeline activity every `interval` until shutdown.
pub async fn run(hub: Hub, interval: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The first tick fires immediately; skip it so the first summary has
    // something to say.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let stats = hub.stats.snapshot();
                let total_alerts: u64 = stats.iter().map(|s| s.temp_alerts + s.air_alerts).sum();

                info!(
                    received = hub.counters.received.load(Ordering::Relaxed),
                    committed = hub.counters.committed.load(Ordering::Relaxed),
                    rejected = hub.counters.rejected.load(Ordering::Relaxed),
                    dropped = hub.counters.dropped.load(Ordering::Relaxed),
                    rooms = stats.len(),
                    total_alerts,
                    "ingest summary"
                );
            }
            res = shutdown.changed() => {
                if res.is_err() || *shutdown.borrow() {
                    return;
                }
            }
        }
    }
}
