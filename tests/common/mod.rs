//! Shared builders for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use runmetrics::splits::SplitUnit;
use runmetrics::storage::Database;
use runmetrics::track::{Track, TrackPoint};
use runmetrics::workouts::WorkoutService;

/// Fixed reference start time so test output is reproducible.
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
}

pub fn point(start: DateTime<Utc>, elapsed_s: f64, distance_m: f64) -> TrackPoint {
    TrackPoint {
        timestamp: start + Duration::milliseconds((elapsed_s * 1000.0).round() as i64),
        latitude: 59.33,
        longitude: 18.06,
        cumulative_distance_m: distance_m,
        elevation_m: None,
        heart_rate_bpm: None,
        cadence_rpm: None,
        power_watts: None,
    }
}

/// Track from (elapsed seconds, cumulative meters) pairs.
pub fn track_from(samples: &[(f64, f64)]) -> Track {
    let start = start_time();
    let points = samples.iter().map(|&(t, d)| point(start, t, d)).collect();
    Track::from_points(points).unwrap()
}

/// Constant-pace track sampled every `interval_s` seconds, starting at
/// `start`. The last sample lands exactly on (total_s, total_m).
pub fn constant_pace_track(
    start: DateTime<Utc>,
    total_m: f64,
    total_s: f64,
    interval_s: f64,
) -> Track {
    let speed = total_m / total_s;
    let steps = (total_s / interval_s).floor() as usize;
    let mut points = Vec::new();
    for i in 0..=steps {
        let t = i as f64 * interval_s;
        if t >= total_s - 1e-9 {
            break;
        }
        points.push(point(start, t, speed * t));
    }
    points.push(point(start, total_s, total_m));
    Track::from_points(points).unwrap()
}

/// A workout service over a fresh in-memory database.
pub fn service() -> WorkoutService {
    let db = Database::open_in_memory().unwrap();
    WorkoutService::new(Arc::new(Mutex::new(db)), SplitUnit::Metric)
}
