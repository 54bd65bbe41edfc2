//! Read-side query operations.
//!
//! The query service observes the store and the aggregator; it never
//! mutates either. Every operation returns data that existed at some point
//! during the call - readings and stats are copied whole under the lock, so
//! a caller never sees a torn value - and an empty collection is the valid
//! "no data yet" answer, distinct from [`QueryError::Unavailable`].

use std::sync::Arc;

use thiserror::Error;

use roomsense_types::{AlertEvent, Reading, RoomStats};

use crate::aggregate::Aggregator;
use crate::ingest::Hub;
use crate::store::Store;

/// History returned when the caller does not ask for a specific amount.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Upper bound on history a single query may request.
pub const MAX_HISTORY_LIMIT: usize = 100;

/// Lock acquisition attempts before a query is reported unavailable. Each
/// attempt already waits a bounded interval, so the worst case stays well
/// under the dashboard's caller-side timeout.
const RETRY_ATTEMPTS: usize = 3;

/// Query failures.
///
/// `Unavailable` is transient - the state lock could not be acquired within
/// the bounded retry budget. Callers surface it as an explicit error so the
/// dashboard can distinguish "something broke" from "nothing happened yet".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("state snapshot unavailable")]
    Unavailable,
}

/// Read-only view over a hub's store and aggregator.
#[derive(Debug, Clone)]
pub struct QueryService {
    store: Arc<Store>,
    stats: Arc<Aggregator>,
}

impl QueryService {
    pub fn new(hub: &Hub) -> Self {
        Self {
            store: hub.store.clone(),
            stats: hub.stats.clone(),
        }
    }

    /// The most recent reading for each room with at least one reading.
    pub fn latest(&self) -> Result<Vec<Reading>, QueryError> {
        with_retry(|| self.store.try_latest_per_room())
    }

    /// Rolling statistics per room.
    pub fn stats(&self) -> Result<Vec<RoomStats>, QueryError> {
        with_retry(|| self.stats.try_snapshot())
    }

    /// Recent reading history, newest first. `limit` defaults to
    /// [`DEFAULT_HISTORY_LIMIT`] and is clamped to [`MAX_HISTORY_LIMIT`].
    pub fn recent(&self, limit: Option<usize>) -> Result<Vec<Reading>, QueryError> {
        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT).min(MAX_HISTORY_LIMIT);
        with_retry(|| self.store.try_recent(limit))
    }

    /// Recent alert events, newest first, with the same limit handling as
    /// [`QueryService::recent`].
    pub fn alerts(&self, limit: Option<usize>) -> Result<Vec<AlertEvent>, QueryError> {
        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT).min(MAX_HISTORY_LIMIT);
        with_retry(|| self.store.try_recent_alerts(limit))
    }
}

/// Retry a bounded-wait read a few times before giving up.
fn with_retry<T>(attempt: impl Fn() -> Option<T>) -> Result<T, QueryError> {
    for _ in 0..RETRY_ATTEMPTS {
        if let Some(value) = attempt() {
            return Ok(value);
        }
    }
    Err(QueryError::Unavailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Thresholds;
    use crate::store::Retention;
    use roomsense_types::{AirStatus, ComfortStatus, Room};
    use time::macros::datetime;

    fn reading(room: Room, temperature: f64) -> Reading {
        Reading {
            room,
            device_id: "sensor".to_string(),
            timestamp: datetime!(2024-06-01 12:00:00 UTC),
            temperature,
            humidity: 50.0,
            air_quality: 40.0,
            light_level: 300.0,
            temp_status: ComfortStatus::Normal,
            humidity_status: Some(ComfortStatus::Normal),
            air_status: AirStatus::Normal,
        }
    }

    fn service_with_hub() -> (QueryService, Hub) {
        let hub = Hub::new(Thresholds::new(), Retention::default(), 128);
        (QueryService::new(&hub), hub)
    }

    #[test]
    fn empty_state_yields_empty_collections_not_errors() {
        let (queries, _hub) = service_with_hub();

        assert_eq!(queries.latest().unwrap(), vec![]);
        assert_eq!(queries.stats().unwrap(), vec![]);
        assert_eq!(queries.recent(None).unwrap(), vec![]);
        assert_eq!(queries.alerts(None).unwrap(), vec![]);
    }

    #[test]
    fn recent_applies_default_and_maximum_limits() {
        let (queries, hub) = service_with_hub();
        for i in 0..120 {
            hub.store.append(reading(Room::Bedroom, i as f64)).unwrap();
        }

        assert_eq!(queries.recent(None).unwrap().len(), 50);
        assert_eq!(queries.recent(Some(10)).unwrap().len(), 10);
        assert_eq!(queries.recent(Some(100_000)).unwrap().len(), 100);
    }

    #[test]
    fn latest_reflects_the_store() {
        let (queries, hub) = service_with_hub();
        hub.store.append(reading(Room::Kitchen, 21.0)).unwrap();
        hub.store.append(reading(Room::Kitchen, 26.0)).unwrap();

        let latest = queries.latest().unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].temperature, 26.0);
    }

    #[test]
    fn retry_gives_up_after_bounded_attempts() {
        assert_eq!(with_retry(|| None::<()>), Err(QueryError::Unavailable));
        assert_eq!(with_retry(|| Some(7)), Ok(7));

        // Succeeding on a later attempt is still a success.
        let calls = std::cell::Cell::new(0);
        let result = with_retry(|| {
            calls.set(calls.get() + 1);
            (calls.get() >= 2).then_some("ready")
        });
        assert_eq!(result, Ok("ready"));
        assert_eq!(calls.get(), 2);
    }
}
