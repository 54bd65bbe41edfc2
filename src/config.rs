//! Hub configuration.
//!
//! Settings come from three layers, weakest first: serde defaults (which
//! match the deployed sensor fleet), an optional TOML file, and
//! `ROOMSENSE`-prefixed environment variables (`ROOMSENSE__MQTT__HOST`,
//! `ROOMSENSE__API__LISTEN_ADDR`, ...). CLI flags override individual
//! fields on top in `main`.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::api::ApiSettings;
use crate::classify::Thresholds;
use crate::ingest::IngestSettings;
use crate::source::mqtt::MqttSettings;
use crate::store::Retention;

/// Complete hub settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub mqtt: MqttSettings,
    pub api: ApiSettings,
    pub thresholds: Thresholds,
    pub store: StoreSettings,
    pub ingest: IngestSettings,
    pub report: ReportSettings,
}

/// Reading retention settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Readings kept in the history window.
    pub retain: usize,
    /// Keep all readings instead of a window. Appends fail once the hard
    /// ceiling is reached, so this is only for short diagnostic runs.
    pub unbounded: bool,
    /// Alert events kept.
    pub alert_retain: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            retain: 4096,
            unbounded: false,
            alert_retain: 1024,
        }
    }
}

impl StoreSettings {
    pub fn retention(&self) -> Retention {
        if self.unbounded {
            Retention::Unbounded
        } else {
            Retention::Window(self.retain)
        }
    }
}

/// Periodic summary logging settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub interval_secs: u64,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self { interval_secs: 30 }
    }
}

impl Settings {
    /// Load settings from an optional file plus the environment.
    pub fn load(path: Option<&Path>) -> Result<Settings> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let settings: Settings = builder
            .add_source(
                Environment::with_prefix("ROOMSENSE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("failed to read configuration")?
            .try_deserialize()
            .context("invalid configuration")?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        ensure!(self.store.retain > 0, "store.retain must be positive");
        ensure!(
            self.ingest.queue_capacity > 0,
            "ingest.queue_capacity must be positive"
        );
        ensure!(
            self.report.interval_secs > 0,
            "report.interval_secs must be positive"
        );

        for (name, band) in [
            ("thresholds.temperature", &self.thresholds.temperature),
            ("thresholds.humidity", &self.thresholds.humidity),
        ] {
            ensure!(
                band.comfort_low <= band.comfort_high,
                "{name}: comfort_low must not exceed comfort_high"
            );
            ensure!(
                band.alert_margin >= 0.0,
                "{name}: alert_margin must not be negative"
            );
        }
        ensure!(
            self.thresholds.air_quality.poor <= self.thresholds.air_quality.alert,
            "thresholds.air_quality: poor must not exceed alert"
        );

        Ok(())
    }
}
