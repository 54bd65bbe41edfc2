//! Authoritative reading storage.
//!
//! The store is the single owner of committed readings: an append-only log
//! ordered by commit sequence, a latest-value slot per room, and a bounded
//! alert log. One `parking_lot` lock guards the whole structure; every
//! critical section is a short, I/O-free copy or insert, so readers and the
//! per-room writers only ever contend for microseconds.

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use parking_lot::RwLock;
use thiserror::Error;

use roomsense_types::{AlertEvent, Reading, Room};

/// Hard ceiling on retained readings when retention is unbounded. Hitting
/// it means the retention configuration is wrong for the ingest rate, and
/// the store refuses further appends rather than growing without bound.
const HARD_CEILING: usize = 1 << 20;

/// How long a bounded (`try_*`) reader waits for the lock before reporting
/// the snapshot unavailable.
const READ_TIMEOUT: Duration = Duration::from_millis(50);

/// Default number of alert events retained.
const DEFAULT_ALERT_CAPACITY: usize = 1024;

/// What happens to old readings as new ones arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    /// Keep the most recent `n` readings, evicting the oldest beyond that.
    /// The latest-per-room slots are unaffected by eviction.
    Window(usize),
    /// Keep everything, failing appends at a hard ceiling.
    Unbounded,
}

impl Default for Retention {
    fn default() -> Self {
        Retention::Window(4096)
    }
}

/// Store failures. Appending can only fail on resource exhaustion, which is
/// fatal to the ingestion path - it is never retried.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("append log exhausted at {len} readings with unbounded retention")]
    Exhausted { len: usize },
}

#[derive(Debug, Clone)]
struct Committed {
    seq: u64,
    reading: Reading,
}

#[derive(Debug, Default)]
struct Inner {
    log: VecDeque<Committed>,
    latest: BTreeMap<Room, Committed>,
    alerts: VecDeque<AlertEvent>,
    next_seq: u64,
}

/// The committed-readings store.
#[derive(Debug)]
pub struct Store {
    inner: RwLock<Inner>,
    retention: Retention,
    hard_ceiling: usize,
    alert_capacity: usize,
}

impl Store {
    pub fn new(retention: Retention) -> Self {
        Self::with_alert_capacity(retention, DEFAULT_ALERT_CAPACITY)
    }

    pub fn with_alert_capacity(retention: Retention, alert_capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            retention,
            hard_ceiling: HARD_CEILING,
            alert_capacity,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_hard_ceiling(retention: Retention, hard_ceiling: usize) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            retention,
            hard_ceiling,
            alert_capacity: DEFAULT_ALERT_CAPACITY,
        }
    }

    /// Append one classified reading, returning its commit sequence number.
    ///
    /// This is the only mutator of the reading log. Commit order - not the
    /// reading's own timestamp - is the recency key for every query.
    pub fn append(&self, reading: Reading) -> Result<u64, StoreError> {
        let mut inner = self.inner.write();

        if matches!(self.retention, Retention::Unbounded) && inner.log.len() >= self.hard_ceiling {
            return Err(StoreError::Exhausted {
                len: inner.log.len(),
            });
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;

        inner.latest.insert(
            reading.room,
            Committed {
                seq,
                reading: reading.clone(),
            },
        );
        inner.log.push_back(Committed { seq, reading });

        if let Retention::Window(capacity) = self.retention {
            while inner.log.len() > capacity {
                inner.log.pop_front();
            }
        }

        Ok(seq)
    }

    /// Record a threshold violation in the bounded alert log.
    pub fn record_alert(&self, event: AlertEvent) {
        let mut inner = self.inner.write();
        inner.alerts.push_back(event);
        while inner.alerts.len() > self.alert_capacity {
            inner.alerts.pop_front();
        }
    }

    /// Total readings ever committed (not reduced by eviction).
    pub fn committed(&self) -> u64 {
        self.inner.read().next_seq
    }

    /// The most recently committed reading for each room that has ever
    /// reported, ordered by room. Empty when nothing has been ingested yet -
    /// a valid result, not an error.
    pub fn latest_per_room(&self) -> Vec<Reading> {
        collect_latest(&self.inner.read())
    }

    /// The last `n` committed readings, newest first.
    pub fn recent(&self, n: usize) -> Vec<Reading> {
        collect_recent(&self.inner.read(), n)
    }

    /// The last `n` recorded alert events, newest first.
    pub fn recent_alerts(&self, n: usize) -> Vec<AlertEvent> {
        collect_alerts(&self.inner.read(), n)
    }

    /// Bounded-wait variant of [`Store::latest_per_room`] for query-side
    /// callers that must not block behind the writers; `None` means the
    /// lock could not be acquired within the read timeout.
    pub fn try_latest_per_room(&self) -> Option<Vec<Reading>> {
        self.inner
            .try_read_for(READ_TIMEOUT)
            .map(|inner| collect_latest(&inner))
    }

    /// Bounded-wait variant of [`Store::recent`].
    pub fn try_recent(&self, n: usize) -> Option<Vec<Reading>> {
        self.inner
            .try_read_for(READ_TIMEOUT)
            .map(|inner| collect_recent(&inner, n))
    }

    /// Bounded-wait variant of [`Store::recent_alerts`].
    pub fn try_recent_alerts(&self, n: usize) -> Option<Vec<AlertEvent>> {
        self.inner
            .try_read_for(READ_TIMEOUT)
            .map(|inner| collect_alerts(&inner, n))
    }
}

fn collect_latest(inner: &Inner) -> Vec<Reading> {
    inner.latest.values().map(|c| c.reading.clone()).collect()
}

fn collect_recent(inner: &Inner, n: usize) -> Vec<Reading> {
    inner
        .log
        .iter()
        .rev()
        .take(n)
        .map(|c| c.reading.clone())
        .collect()
}

fn collect_alerts(inner: &Inner, n: usize) -> Vec<AlertEvent> {
    inner.alerts.iter().rev().take(n).cloned().collect()
}
