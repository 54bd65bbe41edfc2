//! The ingestion pipeline.
//!
//! Every inbound payload moves through `received -> decoded -> classified ->
//! committed`, or stops at a rejection boundary where it is counted and
//! dropped - telemetry is a lossy stream and per-message failures are never
//! fatal. A router task owns the inbound channel and performs the pure
//! decode/classify steps; commits go through one single-writer worker per
//! room, so updates to a room's latest slot and statistics are serialized
//! while different rooms commit concurrently.
//!
//! Backpressure is bounded per room: when a room's queue is full the
//! incoming reading is dropped and counted (FIFO, drop-newest) instead of
//! blocking the whole pipeline on one slow room.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, trace, warn};

use roomsense_types::{Reading, Room};

use crate::aggregate::Aggregator;
use crate::classify::{alert_events, classify, Thresholds};
use crate::decode::decode;
use crate::store::{Retention, Store, StoreError};

/// Pipeline tuning knobs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    /// Capacity of each room's commit queue.
    pub queue_capacity: usize,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self { queue_capacity: 64 }
    }
}

/// Message accounting across the pipeline's lifetime.
///
/// Every received message ends up in exactly one of `committed`,
/// `rejected`, or `dropped` once the pipeline has drained.
#[derive(Debug, Default)]
pub struct IngestCounters {
    pub received: AtomicU64,
    pub committed: AtomicU64,
    pub rejected: AtomicU64,
    pub dropped: AtomicU64,
}

/// Shared pipeline state, constructed once and passed explicitly to the
/// ingestion loop and the query service. There is no ambient global: a
/// process could run two independent hubs side by side.
#[derive(Debug, Clone)]
pub struct Hub {
    pub store: Arc<Store>,
    pub stats: Arc<Aggregator>,
    pub thresholds: Arc<Thresholds>,
    pub counters: Arc<IngestCounters>,
}

impl Hub {
    pub fn new(thresholds: Thresholds, retention: Retention, alert_capacity: usize) -> Self {
        Self {
            store: Arc::new(Store::with_alert_capacity(retention, alert_capacity)),
            stats: Arc::new(Aggregator::new()),
            thresholds: Arc::new(thresholds),
            counters: Arc::new(IngestCounters::default()),
        }
    }
}

/// Fatal pipeline failures. Per-message decode failures never surface here;
/// only store exhaustion halts intake.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("store append failed: {0}")]
    Store(#[from] StoreError),
}

/// Run the pipeline until the inbound channel closes, shutdown is
/// signalled, or the store fails.
///
/// On shutdown the router stops accepting new messages and the per-room
/// workers drain their queues before this returns, so nothing that was
/// received goes unaccounted for.
pub async fn run(
    hub: Hub,
    settings: IngestSettings,
    mut inbound: mpsc::Receiver<Vec<u8>>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), IngestError> {
    let (fatal_tx, mut fatal_rx) = watch::channel(false);

    let mut senders: BTreeMap<Room, mpsc::Sender<Reading>> = BTreeMap::new();
    let mut workers: Vec<JoinHandle<Result<(), IngestError>>> = Vec::new();

    for room in Room::ALL {
        let (tx, rx) = mpsc::channel(settings.queue_capacity.max(1));
        senders.insert(room, tx);
        workers.push(tokio::spawn(commit_loop(
            room,
            rx,
            hub.clone(),
            fatal_tx.clone(),
        )));
    }

    loop {
        tokio::select! {
            res = shutdown.changed() => {
                if res.is_err() || *shutdown.borrow() {
                    debug!("ingest shutdown requested");
                    break;
                }
            }
            _ = fatal_rx.changed() => {
                if *fatal_rx.borrow() {
                    error!("halting intake after store failure");
                    break;
                }
            }
            payload = inbound.recv() => match payload {
                None => {
                    debug!("inbound channel closed");
                    break;
                }
                Some(bytes) => handle_message(&hub, &senders, &bytes),
            }
        }
    }

    // Dropping the senders lets each worker drain its queue and exit.
    drop(senders);

    let mut failure = None;
    for worker in workers {
        match worker.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => failure = failure.or(Some(e)),
            Err(e) => error!(error = %e, "commit worker panicked"),
        }
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Decode and classify one payload, then hand it to its room's worker.
fn handle_message(hub: &Hub, senders: &BTreeMap<Room, mpsc::Sender<Reading>>, payload: &[u8]) {
    hub.counters.received.fetch_add(1, Ordering::Relaxed);

    let report = match decode(payload, OffsetDateTime::now_utc()) {
        Ok(report) => report,
        Err(e) => {
            hub.counters.rejected.fetch_add(1, Ordering::Relaxed);
            debug!(error = %e, "rejected inbound message");
            return;
        }
    };

    let reading = classify(report, &hub.thresholds);

    match senders[&reading.room].try_send(reading) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(reading)) => {
            hub.counters.dropped.fetch_add(1, Ordering::Relaxed);
            warn!(room = %reading.room, "room queue full, dropping newest reading");
        }
        Err(mpsc::error::TrySendError::Closed(reading)) => {
            // Worker already stopped (store failure in flight); intake is
            // about to halt via the fatal signal.
            hub.counters.dropped.fetch_add(1, Ordering::Relaxed);
            debug!(room = %reading.room, "room worker gone, dropping reading");
        }
    }
}

/// Single-writer commit loop for one room.
///
/// A reading counts as committed only after both the store append and the
/// statistics update have happened; the next reading for this room is not
/// processed until then.
async fn commit_loop(
    room: Room,
    mut queue: mpsc::Receiver<Reading>,
    hub: Hub,
    fatal: watch::Sender<bool>,
) -> Result<(), IngestError> {
    while let Some(reading) = queue.recv().await {
        match hub.store.append(reading.clone()) {
            Ok(seq) => {
                hub.stats.update(&reading);
                for event in alert_events(&reading, &hub.thresholds) {
                    warn!(
                        room = %event.room,
                        kind = ?event.kind,
                        value = event.value,
                        threshold = event.threshold,
                        "threshold violation"
                    );
                    hub.store.record_alert(event);
                }
                hub.counters.committed.fetch_add(1, Ordering::Relaxed);
                trace!(room = %room, seq, "committed reading");
            }
            Err(e) => {
                error!(room = %room, error = %e, "store append failed");
                let _ = fatal.send(true);
                // Neither the failed reading nor anything still queued will
                // ever commit; account for all of them.
                hub.counters.dropped.fetch_add(1, Ordering::Relaxed);
                queue.close();
                while queue.try_recv().is_ok() {
                    hub.counters.dropped.fetch_add(1, Ordering::Relaxed);
                }
                return Err(IngestError::Store(e));
            }
        }
    }
    Ok(())
}
