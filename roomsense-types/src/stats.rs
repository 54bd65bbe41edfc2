//! Rolling per-room statistics.

use crate::{Reading, Room};

/// Incrementally maintained aggregate summary for one room.
///
/// Averages use the streaming update `avg' = avg + (x - avg) / n'` rather
/// than a sum-and-divide, so they stay numerically stable over long-running
/// ingestion. `total_readings` only ever grows; alert counters increment on
/// non-normal classifications.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoomStats {
    pub room: Room,
    pub total_readings: u64,
    pub avg_temp: f64,
    pub avg_humidity: f64,
    pub avg_air_quality: f64,
    pub temp_alerts: u64,
    pub air_alerts: u64,
}

impl RoomStats {
    /// Empty statistics for a room that has not reported yet.
    pub fn new(room: Room) -> Self {
        Self {
            room,
            total_readings: 0,
            avg_temp: 0.0,
            avg_humidity: 0.0,
            avg_air_quality: 0.0,
            temp_alerts: 0,
            air_alerts: 0,
        }
    }

    /// Fold one classified reading into the aggregates.
    ///
    /// The reading must belong to this room; callers route by room before
    /// updating, so a mismatch is a programming error.
    pub fn record(&mut self, reading: &Reading) {
        debug_assert_eq!(reading.room, self.room);

        self.total_readings += 1;
        let n = self.total_readings as f64;
        self.avg_temp += (reading.temperature - self.avg_temp) / n;
        self.avg_humidity += (reading.humidity - self.avg_humidity) / n;
        self.avg_air_quality += (reading.air_quality - self.avg_air_quality) / n;

        if !reading.temp_status.is_normal() {
            self.temp_alerts += 1;
        }
        if !reading.air_status.is_normal() {
            self.air_alerts += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AirStatus, ComfortStatus};
    use time::macros::datetime;

    fn reading(temperature: f64, humidity: f64, air_quality: f64) -> Reading {
        Reading {
            room: Room::Bedroom,
            device_id: "smart-home-sensor-03".to_string(),
            timestamp: datetime!(2024-06-01 12:00:00 UTC),
            temperature,
            humidity,
            air_quality,
            light_level: 120.0,
            temp_status: ComfortStatus::Normal,
            humidity_status: Some(ComfortStatus::Normal),
            air_status: AirStatus::Normal,
        }
    }

    #[test]
    fn running_mean_matches_arithmetic_mean() {
        let temps = [16.2, 21.7, 24.0, 19.5, 30.1, 18.8, 22.4];
        let mut stats = RoomStats::new(Room::Bedroom);

        for &t in &temps {
            stats.record(&reading(t, 50.0, 40.0));
        }

        let expected = temps.iter().sum::<f64>() / temps.len() as f64;
        assert_eq!(stats.total_readings, temps.len() as u64);
        assert!((stats.avg_temp - expected).abs() < 1e-9);
        assert!((stats.avg_humidity - 50.0).abs() < 1e-9);
    }

    #[test]
    fn alert_counters_only_count_non_normal() {
        let mut stats = RoomStats::new(Room::Bedroom);

        stats.record(&reading(22.0, 50.0, 40.0));
        assert_eq!(stats.temp_alerts, 0);
        assert_eq!(stats.air_alerts, 0);

        let mut hot = reading(36.0, 50.0, 40.0);
        hot.temp_status = ComfortStatus::Alert;
        stats.record(&hot);

        let mut warm = reading(30.0, 50.0, 40.0);
        warm.temp_status = ComfortStatus::Warning;
        stats.record(&warm);

        let mut smoky = reading(22.0, 50.0, 220.0);
        smoky.air_status = AirStatus::Poor;
        stats.record(&smoky);

        assert_eq!(stats.temp_alerts, 2);
        assert_eq!(stats.air_alerts, 1);
        assert_eq!(stats.total_readings, 4);
    }

    #[test]
    fn first_reading_sets_the_average_exactly() {
        let mut stats = RoomStats::new(Room::Bedroom);
        stats.record(&reading(19.5, 44.0, 87.0));

        assert_eq!(stats.avg_temp, 19.5);
        assert_eq!(stats.avg_humidity, 44.0);
        assert_eq!(stats.avg_air_quality, 87.0);
    }
}
