//! # roomsense-types
//!
//! Core types for roomsense: the schema shared between the telemetry
//! pipeline and the consumers of its query API.
//!
//! This crate is deliberately passive - it defines the closed [`Room`] set,
//! the classification status labels, the classified [`Reading`] value, the
//! incrementally maintained [`RoomStats`] aggregate, and the [`AlertEvent`]
//! record, together with the small amount of math ([`RoomStats::record`])
//! that belongs to the data itself. Everything stateful (locking, channels,
//! retention) lives in the `roomsense` crate.
//!
//! ## Features
//!
//! - `serde`: JSON (de)serialization for every type, matching the wire
//!   format served by the hub's query API. Timestamps are RFC 3339.
//!
//! ## Example
//!
//! ```rust
//! use roomsense_types::{Room, RoomStats};
//!
//! let mut stats = RoomStats::new(Room::Kitchen);
//! assert_eq!(stats.total_readings, 0);
//! assert_eq!(Room::from_name("kitchen"), Some(Room::Kitchen));
//! ```

mod alert;
mod reading;
mod room;
mod stats;
mod status;

pub use alert::{AlertEvent, AlertKind};
pub use reading::Reading;
pub use room::Room;
pub use stats::RoomStats;
pub use status::{AirStatus, ComfortStatus};
