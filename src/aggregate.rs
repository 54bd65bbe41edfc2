//! Rolling statistics aggregation.
//!
//! The aggregator maintains one [`RoomStats`] per room, created lazily on
//! the room's first reading and updated incrementally on every commit, so
//! stats queries never rescan the reading log. Updates for a single room
//! are serialized by the ingestion pipeline's per-room workers; the lock
//! here additionally makes cross-room updates and snapshot reads safe.

use std::collections::BTreeMap;
use std::time::Duration;

use parking_lot::RwLock;

use roomsense_types::{Reading, Room, RoomStats};

/// Matches the store's bounded read wait; see `store::READ_TIMEOUT`.
const READ_TIMEOUT: Duration = Duration::from_millis(50);

/// Incrementally maintained per-room statistics.
#[derive(Debug, Default)]
pub struct Aggregator {
    stats: RwLock<BTreeMap<Room, RoomStats>>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one committed reading into its room's statistics.
    ///
    /// Total over well-formed readings: there is no failure path.
    pub fn update(&self, reading: &Reading) {
        let mut stats = self.stats.write();
        stats
            .entry(reading.room)
            .or_insert_with(|| RoomStats::new(reading.room))
            .record(reading);
    }

    /// A point-in-time copy of every room's statistics, ordered by room.
    /// Safe to hand to a reader while updates continue.
    pub fn snapshot(&self) -> Vec<RoomStats> {
        self.stats.read().values().cloned().collect()
    }

    /// Bounded-wait variant of [`Aggregator::snapshot`]; `None` means the
    /// lock could not be acquired within the read timeout.
    pub fn try_snapshot(&self) -> Option<Vec<RoomStats>> {
        self.stats
            .try_read_for(READ_TIMEOUT)
            .map(|stats| stats.values().cloned().collect())
    }

    /// Statistics for one room, if it has reported.
    pub fn room(&self, room: Room) -> Option<RoomStats> {
        self.stats.read().get(&room).cloned()
    }
}
