//! Fixed-distance split calculator.
//!
//! Partitions a track into fixed-length segments (1 km or 1 mile) and
//! computes duration and pace per segment. Pure function over the track;
//! splits are always regenerated wholesale, never patched.

use serde::{Deserialize, Serialize};

use crate::track::{DistanceCursor, Track};

/// A final partial segment shorter than this is dropped.
pub const MIN_PARTIAL_SPLIT_M: f64 = 1.0;

/// Split unit preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitUnit {
    /// 1 km splits
    #[default]
    Metric,
    /// 1 mile splits
    Imperial,
}

impl SplitUnit {
    /// Split length in meters.
    pub fn meters(self) -> f64 {
        match self {
            SplitUnit::Metric => 1000.0,
            SplitUnit::Imperial => 1609.344,
        }
    }
}

impl std::fmt::Display for SplitUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SplitUnit::Metric => write!(f, "metric"),
            SplitUnit::Imperial => write!(f, "imperial"),
        }
    }
}

/// A fixed-distance segment of a workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Split {
    /// 1-based split number
    pub index: u32,
    /// Segment length in meters (equal to the split unit except for a
    /// trailing partial split)
    pub distance_m: f64,
    /// Segment duration in seconds
    pub duration_s: f64,
    /// Pace in seconds per split unit
    pub pace_s: f64,
}

/// Partition a track into fixed-distance splits.
///
/// Boundary times are linearly interpolated between the bracketing samples,
/// so a split boundary falling mid-sample is timed exactly. A final partial
/// split is included only when longer than [`MIN_PARTIAL_SPLIT_M`].
pub fn compute_splits(track: &Track, split_distance_m: f64) -> Vec<Split> {
    if track.is_empty() || split_distance_m <= 0.0 {
        return Vec::new();
    }

    let total_distance = track.total_distance_m;
    let total_duration = track.total_duration_s;
    let mut cursor = DistanceCursor::new(track);
    let mut splits = Vec::new();

    let mut boundary_time = 0.0;
    let mut index = 1u32;

    loop {
        let boundary = index as f64 * split_distance_m;
        if boundary > total_distance {
            break;
        }

        let time = cursor.time_at(boundary);
        splits.push(Split {
            index,
            distance_m: split_distance_m,
            duration_s: time - boundary_time,
            pace_s: time - boundary_time,
        });
        boundary_time = time;
        index += 1;
    }

    let remainder = total_distance - (index as f64 - 1.0) * split_distance_m;
    if remainder > MIN_PARTIAL_SPLIT_M {
        let duration = total_duration - boundary_time;
        splits.push(Split {
            index,
            distance_m: remainder,
            duration_s: duration,
            pace_s: duration / (remainder / split_distance_m),
        });
    }

    splits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::TrackPoint;
    use chrono::{TimeZone, Utc};

    fn track_from(samples: &[(i64, f64)]) -> Track {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let points = samples
            .iter()
            .map(|&(elapsed_s, distance_m)| TrackPoint {
                timestamp: start + chrono::Duration::seconds(elapsed_s),
                latitude: 45.5,
                longitude: -122.5,
                cumulative_distance_m: distance_m,
                elevation_m: None,
                heart_rate_bpm: None,
                cadence_rpm: None,
                power_watts: None,
            })
            .collect();
        Track::from_points(points).unwrap()
    }

    #[test]
    fn test_even_kilometer_splits() {
        // 4 km at a steady 200 s per km.
        let track = track_from(&[
            (0, 0.0),
            (200, 1000.0),
            (400, 2000.0),
            (600, 3000.0),
            (800, 4000.0),
        ]);

        let splits = compute_splits(&track, 1000.0);
        assert_eq!(splits.len(), 4);
        for (i, split) in splits.iter().enumerate() {
            assert_eq!(split.index, i as u32 + 1);
            assert_eq!(split.distance_m, 1000.0);
            assert!((split.duration_s - 200.0).abs() < 1e-9);
            assert!((split.pace_s - 200.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_boundary_interpolated_between_samples() {
        // Sparse samples: the 1000 m boundary falls between 800 m and
        // 1600 m, reached by interpolation at t = 250 s.
        let track = track_from(&[(0, 0.0), (200, 800.0), (400, 1600.0), (500, 2000.0)]);

        let splits = compute_splits(&track, 1000.0);
        assert_eq!(splits.len(), 2);
        assert!((splits[0].duration_s - 250.0).abs() < 1e-9);
        assert!((splits[1].duration_s - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_final_split() {
        let track = track_from(&[(0, 0.0), (200, 1000.0), (300, 1500.0)]);

        let splits = compute_splits(&track, 1000.0);
        assert_eq!(splits.len(), 2);
        assert_eq!(splits[1].distance_m, 500.0);
        assert!((splits[1].duration_s - 100.0).abs() < 1e-9);
        // 100 s over half a unit normalizes to a 200 s pace.
        assert!((splits[1].pace_s - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_dust_remainder_dropped() {
        let track = track_from(&[(0, 0.0), (200, 1000.0), (201, 1000.5)]);

        let splits = compute_splits(&track, 1000.0);
        assert_eq!(splits.len(), 1);
    }

    #[test]
    fn test_track_shorter_than_one_split() {
        let track = track_from(&[(0, 0.0), (120, 600.0)]);

        let splits = compute_splits(&track, 1000.0);
        assert_eq!(splits.len(), 1);
        assert_eq!(splits[0].distance_m, 600.0);
        assert!((splits[0].duration_s - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_split_distances_sum_to_total() {
        let track = track_from(&[(0, 0.0), (300, 1400.0), (700, 3300.0), (900, 4250.0)]);

        let splits = compute_splits(&track, 1000.0);
        let sum: f64 = splits.iter().map(|s| s.distance_m).sum();
        assert!((sum - track.total_distance_m).abs() < 1e-6);
    }

    #[test]
    fn test_imperial_unit_length() {
        assert_eq!(SplitUnit::Metric.meters(), 1000.0);
        assert_eq!(SplitUnit::Imperial.meters(), 1609.344);
    }
}
