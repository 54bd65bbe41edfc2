//! Classified telemetry readings.

use time::OffsetDateTime;

use crate::{AirStatus, ComfortStatus, Room};

/// One classified telemetry sample from one device at one point in time.
///
/// A `Reading` is immutable once built: the measurement values come from the
/// decoded device report, and the status fields reflect the alert thresholds
/// that were active when the reading was classified. Re-classifying a
/// reading under different thresholds produces a new value rather than
/// mutating this one.
///
/// `timestamp` is the capture time claimed by the device (falling back to
/// receipt time when the report carried none), not the time the hub
/// committed the reading. Commit ordering is tracked by the store, not here.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reading {
    pub room: Room,
    pub device_id: String,

    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub timestamp: OffsetDateTime,

    /// Temperature in degrees Celsius.
    pub temperature: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
    /// Air quality index (lower is better).
    pub air_quality: f64,
    /// Illuminance in lux.
    pub light_level: f64,

    pub temp_status: ComfortStatus,

    /// Humidity status is optional on the wire: the consuming dashboard
    /// treats a missing value as normal.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub humidity_status: Option<ComfortStatus>,

    pub air_status: AirStatus,
}

impl Reading {
    /// True if any dimension of this reading is classified non-normal.
    pub fn has_alert(&self) -> bool {
        !self.temp_status.is_normal()
            || !self.air_status.is_normal()
            || self.humidity_status.is_some_and(|s| !s.is_normal())
    }
}
