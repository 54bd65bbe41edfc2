//! Alert event records.

use time::OffsetDateTime;

use crate::Room;

/// The kind of threshold violation an [`AlertEvent`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum AlertKind {
    HighTemperature,
    LowTemperature,
    PoorAirQuality,
}

/// A recorded threshold violation.
///
/// Emitted alongside the reading that triggered it: `value` is the offending
/// measurement and `threshold` the boundary it crossed. Alert events are a
/// bounded operational log, not a second source of truth - the aggregate
/// alert counters in [`crate::RoomStats`] are maintained independently.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlertEvent {
    pub room: Room,
    pub device_id: String,
    pub kind: AlertKind,
    pub value: f64,
    pub threshold: f64,

    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub timestamp: OffsetDateTime,
}
