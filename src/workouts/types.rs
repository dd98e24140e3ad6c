//! Workout summary types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::track::Track;

/// A recorded workout with summary aggregates.
///
/// Exactly one live track belongs to a workout; the summary fields are
/// recomputed from the retained samples whenever the track is replaced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workout {
    /// Unique identifier
    pub id: Uuid,
    /// Display name
    pub name: Option<String>,
    /// Start of the workout (first sample timestamp)
    pub started_at: DateTime<Utc>,
    /// Total distance in meters
    pub total_distance_m: f64,
    /// Total duration in seconds
    pub total_duration_s: f64,
    /// Average pace in seconds per kilometer
    pub avg_pace_s: Option<f64>,
    /// Total elevation gain in meters
    pub elevation_gain_m: f64,
    /// Total elevation loss in meters
    pub elevation_loss_m: f64,
    /// Row creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Workout {
    /// Create a workout summarizing a track.
    pub fn from_track(name: Option<String>, track: &Track) -> Self {
        let mut workout = Self {
            id: Uuid::new_v4(),
            name,
            started_at: track.start_time,
            total_distance_m: 0.0,
            total_duration_s: 0.0,
            avg_pace_s: None,
            elevation_gain_m: 0.0,
            elevation_loss_m: 0.0,
            created_at: Utc::now(),
        };
        workout.refresh_from_track(track);
        workout
    }

    /// Recompute the summary aggregates from a (possibly replaced) track.
    pub fn refresh_from_track(&mut self, track: &Track) {
        let (gain, loss) = track.elevation_aggregates();
        self.started_at = track.start_time;
        self.total_distance_m = track.total_distance_m;
        self.total_duration_s = track.total_duration_s;
        self.avg_pace_s = average_pace_s(track.total_distance_m, track.total_duration_s);
        self.elevation_gain_m = gain;
        self.elevation_loss_m = loss;
    }
}

/// Average pace in seconds per kilometer, `None` for zero-distance tracks.
pub fn average_pace_s(total_distance_m: f64, total_duration_s: f64) -> Option<f64> {
    if total_distance_m > 0.0 {
        Some(total_duration_s / (total_distance_m / 1000.0))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::TrackPoint;
    use chrono::TimeZone;

    #[test]
    fn test_from_track_summary() {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let points = (0..=4)
            .map(|i| TrackPoint {
                timestamp: start + chrono::Duration::seconds(i * 300),
                latitude: 45.5,
                longitude: -122.5,
                cumulative_distance_m: i as f64 * 1000.0,
                elevation_m: Some(100.0 + i as f64),
                heart_rate_bpm: None,
                cadence_rpm: None,
                power_watts: None,
            })
            .collect();
        let track = Track::from_points(points).unwrap();

        let workout = Workout::from_track(Some("Morning Run".to_string()), &track);
        assert_eq!(workout.total_distance_m, 4000.0);
        assert_eq!(workout.total_duration_s, 1200.0);
        assert!((workout.avg_pace_s.unwrap() - 300.0).abs() < 1e-9);
        assert!((workout.elevation_gain_m - 4.0).abs() < 1e-9);
        assert_eq!(workout.elevation_loss_m, 0.0);
    }

    #[test]
    fn test_average_pace_zero_distance() {
        assert_eq!(average_pace_s(0.0, 600.0), None);
    }
}
