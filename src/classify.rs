//! Alert classification.
//!
//! Classification is a pure function of one decoded report and the
//! configured [`Thresholds`]: same input and same configuration always
//! yield the same statuses. There is no failure path - the decoder has
//! already guaranteed finite measurements and a known room, so every report
//! classifies.

use serde::Deserialize;

use roomsense_types::{AirStatus, AlertEvent, AlertKind, ComfortStatus, Reading};

use crate::decode::Report;

/// Thresholds for a banded measurement (temperature, humidity).
///
/// Values inside `[comfort_low, comfort_high]` are normal; values outside
/// the band by at most `alert_margin` are a warning; anything further is an
/// alert. The tiers are symmetric around the band.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BandThresholds {
    pub comfort_low: f64,
    pub comfort_high: f64,
    pub alert_margin: f64,
}

impl Default for BandThresholds {
    fn default() -> Self {
        // Temperature defaults; humidity overrides these in Thresholds.
        Self {
            comfort_low: 18.0,
            comfort_high: 28.0,
            alert_margin: 8.0,
        }
    }
}

impl BandThresholds {
    pub fn classify(&self, value: f64) -> ComfortStatus {
        if value >= self.comfort_low && value <= self.comfort_high {
            ComfortStatus::Normal
        } else if value >= self.comfort_low - self.alert_margin
            && value <= self.comfort_high + self.alert_margin
        {
            ComfortStatus::Warning
        } else {
            ComfortStatus::Alert
        }
    }

    /// Upper alert boundary (`comfort_high + alert_margin`).
    pub fn alert_above(&self) -> f64 {
        self.comfort_high + self.alert_margin
    }

    /// Lower alert boundary (`comfort_low - alert_margin`).
    pub fn alert_below(&self) -> f64 {
        self.comfort_low - self.alert_margin
    }
}

/// Thresholds for the air-quality index, where lower is better.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AirThresholds {
    pub poor: f64,
    pub alert: f64,
}

impl Default for AirThresholds {
    fn default() -> Self {
        Self {
            poor: 150.0,
            alert: 300.0,
        }
    }
}

impl AirThresholds {
    pub fn classify(&self, value: f64) -> AirStatus {
        if value < self.poor {
            AirStatus::Normal
        } else if value < self.alert {
            AirStatus::Poor
        } else {
            AirStatus::Alert
        }
    }
}

/// The full classification configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub temperature: BandThresholds,
    pub humidity: BandThresholds,
    pub air_quality: AirThresholds,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::new()
    }
}

impl Thresholds {
    /// Defaults matching the deployed sensor fleet: 18-28 degC comfort band,
    /// 30-60 % humidity, air quality poor from AQI 150.
    pub fn new() -> Self {
        Self {
            temperature: BandThresholds::default(),
            humidity: BandThresholds {
                comfort_low: 30.0,
                comfort_high: 60.0,
                alert_margin: 20.0,
            },
            air_quality: AirThresholds::default(),
        }
    }
}

/// Classify one decoded report into an immutable [`Reading`].
///
/// The humidity status is always computed here, but stays optional on the
/// wire because the consuming dashboard treats it as an optional field.
pub fn classify(report: Report, thresholds: &Thresholds) -> Reading {
    Reading {
        temp_status: thresholds.temperature.classify(report.temperature),
        humidity_status: Some(thresholds.humidity.classify(report.humidity)),
        air_status: thresholds.air_quality.classify(report.air_quality),
        room: report.room,
        device_id: report.device_id,
        timestamp: report.timestamp,
        temperature: report.temperature,
        humidity: report.humidity,
        air_quality: report.air_quality,
        light_level: report.light_level,
    }
}

/// Derive the alert records a classified reading triggers.
///
/// Temperature produces an event only at the alert tier; air quality
/// produces one from the poor tier up, matching the alert feed the
/// dashboard has always shown.
pub fn alert_events(reading: &Reading, thresholds: &Thresholds) -> Vec<AlertEvent> {
    let mut events = Vec::new();

    if reading.temp_status == ComfortStatus::Alert {
        let band = &thresholds.temperature;
        let (kind, threshold) = if reading.temperature > band.comfort_high {
            (AlertKind::HighTemperature, band.alert_above())
        } else {
            (AlertKind::LowTemperature, band.alert_below())
        };
        events.push(AlertEvent {
            room: reading.room,
            device_id: reading.device_id.clone(),
            kind,
            value: reading.temperature,
            threshold,
            timestamp: reading.timestamp,
        });
    }

    if !reading.air_status.is_normal() {
        events.push(AlertEvent {
            room: reading.room,
            device_id: reading.device_id.clone(),
            kind: AlertKind::PoorAirQuality,
            value: reading.air_quality,
            threshold: thresholds.air_quality.poor,
            timestamp: reading.timestamp,
        });
    }

    events
}
