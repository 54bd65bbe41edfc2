//! Inbound message decoding.
//!
//! Devices publish one combined JSON report per sampling interval. The
//! decoder turns a raw payload into a validated [`Report`] or a
//! [`DecodeError`]; it has no side effects, so the ingestion loop is free to
//! count and drop rejected payloads without touching any state.

use serde::Deserialize;
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

use roomsense_types::Room;

/// Why a payload was rejected.
///
/// Every variant is a recoverable per-message rejection: the message is
/// dropped and counted, and ingestion continues.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unknown room {0:?}")]
    UnknownRoom(String),

    #[error("field {field} is not a finite number")]
    NonFinite { field: &'static str },

    #[error("unparseable timestamp {0:?}")]
    Timestamp(String),
}

/// The raw wire shape of a combined device report.
///
/// Devices also publish their own locally computed status fields; those are
/// ignored here (serde skips unknown fields) because the hub classifies
/// every reading against its own configured thresholds.
#[derive(Debug, Deserialize)]
struct RawReport {
    room: String,
    device_id: String,
    #[serde(default)]
    timestamp: Option<String>,
    temperature: f64,
    humidity: f64,
    air_quality: f64,
    light_level: f64,
}

/// A decoded, validated device report - not yet classified.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub room: Room,
    pub device_id: String,
    pub timestamp: OffsetDateTime,
    pub temperature: f64,
    pub humidity: f64,
    pub air_quality: f64,
    pub light_level: f64,
}

/// Decode one inbound payload.
///
/// `received_at` is used as the capture time when the report carries no
/// timestamp of its own.
pub fn decode(payload: &[u8], received_at: OffsetDateTime) -> Result<Report, DecodeError> {
    let raw: RawReport = serde_json::from_slice(payload)?;
    validate(raw, received_at)
}

fn validate(raw: RawReport, received_at: OffsetDateTime) -> Result<Report, DecodeError> {
    let room =
        Room::from_name(&raw.room).ok_or_else(|| DecodeError::UnknownRoom(raw.room.clone()))?;

    for (field, value) in [
        ("temperature", raw.temperature),
        ("humidity", raw.humidity),
        ("air_quality", raw.air_quality),
        ("light_level", raw.light_level),
    ] {
        if !value.is_finite() {
            return Err(DecodeError::NonFinite { field });
        }
    }

    let timestamp = match raw.timestamp {
        Some(s) => parse_timestamp(&s)?,
        None => received_at,
    };

    Ok(Report {
        room,
        device_id: raw.device_id,
        timestamp,
        temperature: raw.temperature,
        humidity: raw.humidity,
        air_quality: raw.air_quality,
        light_level: raw.light_level,
    })
}

/// Parse a device timestamp.
///
/// RFC 3339 is the documented format, but deployed firmware emits naive
/// local ISO timestamps without an offset; those are accepted and assumed
/// UTC rather than rejected.
fn parse_timestamp(s: &str) -> Result<OffsetDateTime, DecodeError> {
    if let Ok(ts) = OffsetDateTime::parse(s, &Rfc3339) {
        return Ok(ts);
    }

    let naive = format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
    );
    PrimitiveDateTime::parse(s, naive)
        .map(PrimitiveDateTime::assume_utc)
        .map_err(|_| DecodeError::Timestamp(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const RECEIVED: OffsetDateTime = datetime!(2024-06-01 12:00:00 UTC);

    fn payload(room: &str) -> Vec<u8> {
        format!(
            r#"{{"device_id":"smart-home-sensor-01","room":"{room}",
                 "temperature":22.5,"humidity":48.0,"air_quality":60.0,
                 "light_level":350.0,"timestamp":"2024-06-01T11:59:30Z"}}"#
        )
        .into_bytes()
    }

    #[test]
    fn decodes_a_complete_report() {
        let report = decode(&payload("living_room"), RECEIVED).unwrap();

        assert_eq!(report.room, Room::LivingRoom);
        assert_eq!(report.device_id, "smart-home-sensor-01");
        assert_eq!(report.temperature, 22.5);
        assert_eq!(report.timestamp, datetime!(2024-06-01 11:59:30 UTC));
    }

    #[test]
    fn unknown_room_is_a_recoverable_rejection() {
        let err = decode(&payload("garage"), RECEIVED).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownRoom(name) if name == "garage"));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = decode(b"not json at all", RECEIVED).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    #[test]
    fn missing_measurement_field_is_rejected() {
        let err = decode(
            br#"{"device_id":"d","room":"kitchen","temperature":21.0}"#,
            RECEIVED,
        )
        .unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    #[test]
    fn out_of_range_measurement_is_rejected() {
        // serde_json refuses out-of-range exponents itself; the finite
        // check behind it covers any parser that lets infinity through.
        let err = decode(
            br#"{"device_id":"d","room":"kitchen","temperature":1e999,
                 "humidity":50.0,"air_quality":40.0,"light_level":100.0}"#,
            RECEIVED,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Malformed(_) | DecodeError::NonFinite { .. }
        ));
    }

    #[test]
    fn non_finite_values_fail_validation() {
        // Exercise the finite check directly; a transport that hands us
        // pre-parsed values could still produce NaN.
        let report = RawReport {
            room: "kitchen".to_string(),
            device_id: "d".to_string(),
            timestamp: None,
            temperature: f64::NAN,
            humidity: 50.0,
            air_quality: 40.0,
            light_level: 100.0,
        };
        let err = validate(report, RECEIVED).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::NonFinite {
                field: "temperature"
            }
        ));
    }

    #[test]
    fn missing_timestamp_defaults_to_receipt_time() {
        let report = decode(
            br#"{"device_id":"d","room":"bedroom","temperature":20.0,
                 "humidity":45.0,"air_quality":30.0,"light_level":10.0}"#,
            RECEIVED,
        )
        .unwrap();
        assert_eq!(report.timestamp, RECEIVED);
    }

    #[test]
    fn naive_device_timestamp_is_assumed_utc() {
        let report = decode(
            br#"{"device_id":"d","room":"bedroom","temperature":20.0,
                 "humidity":45.0,"air_quality":30.0,"light_level":10.0,
                 "timestamp":"2024-06-01T08:15:00.250000"}"#,
            RECEIVED,
        )
        .unwrap();
        assert_eq!(report.timestamp, datetime!(2024-06-01 08:15:00.25 UTC));
    }

    #[test]
    fn garbage_timestamp_is_rejected() {
        let err = decode(
            br#"{"device_id":"d","room":"bedroom","temperature":20.0,
                 "humidity":45.0,"air_quality":30.0,"light_level":10.0,
                 "timestamp":"yesterday-ish"}"#,
            RECEIVED,
        )
        .unwrap_err();
        assert!(matches!(err, DecodeError::Timestamp(_)));
    }

    #[test]
    fn device_side_status_fields_are_ignored() {
        let report = decode(
            br#"{"device_id":"d","room":"kitchen","temperature":35.0,
                 "humidity":50.0,"air_quality":40.0,"light_level":100.0,
                 "temp_status":"NORMAL","air_status":"GOOD"}"#,
            RECEIVED,
        )
        .unwrap();
        // The device's opinion of its own status does not survive decoding;
        // classification happens hub-side.
        assert_eq!(report.temperature, 35.0);
    }
}
