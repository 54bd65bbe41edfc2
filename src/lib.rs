//! # roomsense
//!
//! A single-process hub that ingests environmental telemetry (temperature,
//! humidity, air quality, light) published by room sensors over MQTT,
//! classifies every reading against configurable alert thresholds, keeps a
//! bounded in-memory log plus per-room rolling statistics, and serves a
//! small JSON query API for a polling dashboard.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           roomsense hub                          │
//! │                                                                  │
//! │  ┌────────┐   ┌──────────────────────┐   ┌───────────────────┐  │
//! │  │ source │──▶│        ingest        │──▶│  store + stats    │  │
//! │  │ (mqtt) │   │ decode -> classify   │   │  (Hub state)      │  │
//! │  └────────┘   │ -> per-room workers  │   └─────────┬─────────┘  │
//! │               └──────────────────────┘             │            │
//! │                                          ┌─────────▼─────────┐  │
//! │                                          │   query -> api    │──┼─▶ dashboard
//! │                                          └───────────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`decode`]**: raw payload bytes to a validated report; malformed or
//!   unknown-room messages are recoverable rejections
//! - **[`classify`]**: pure, threshold-driven status labels per dimension
//! - **[`store`]**: the authoritative append-only log with per-room latest
//!   slots and a bounded alert log
//! - **[`aggregate`]**: incrementally maintained per-room statistics
//! - **[`ingest`]**: the concurrency driver - one single-writer worker per
//!   room, bounded queues, drop-newest backpressure, clean shutdown
//! - **[`query`] / [`api`]**: read operations and their HTTP surface
//! - **[`source`]**: transport intake (MQTT)
//! - **[`config`]** / **[`report`]**: settings and periodic summary logs
//!
//! ## Usage
//!
//! ```rust
//! use roomsense::classify::Thresholds;
//! use roomsense::ingest::{self, Hub, IngestSettings};
//! use roomsense::query::QueryService;
//! use roomsense::store::Retention;
//! use tokio::sync::{mpsc, watch};
//!
//! # tokio_test::block_on(async {
//! let hub = Hub::new(Thresholds::new(), Retention::default(), 1024);
//! let queries = QueryService::new(&hub);
//!
//! let (tx, rx) = mpsc::channel(64);
//! let (_shutdown_tx, shutdown_rx) = watch::channel(false);
//! let pipeline = tokio::spawn(ingest::run(
//!     hub.clone(),
//!     IngestSettings::default(),
//!     rx,
//!     shutdown_rx,
//! ));
//!
//! tx.send(br#"{"device_id":"smart-home-sensor-02","room":"kitchen",
//!              "temperature":24.0,"humidity":55.0,"air_quality":42.0,
//!              "light_level":640.0}"#.to_vec()).await.unwrap();
//! drop(tx);
//! pipeline.await.unwrap().unwrap();
//!
//! assert_eq!(queries.latest().unwrap().len(), 1);
//! # });
//! ```

pub mod aggregate;
pub mod api;
pub mod classify;
pub mod config;
pub mod decode;
pub mod ingest;
pub mod query;
pub mod report;
pub mod source;
pub mod store;

// Re-export the main types for convenience
pub use aggregate::Aggregator;
pub use classify::Thresholds;
pub use config::Settings;
pub use decode::DecodeError;
pub use ingest::{Hub, IngestCounters, IngestError, IngestSettings};
pub use query::{QueryError, QueryService};
pub use store::{Retention, Store, StoreError};
