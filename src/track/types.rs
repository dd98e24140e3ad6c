//! Canonical track model.
//!
//! A `Track` is the ordered, time-and-distance-indexed sample sequence an
//! upstream decoder produces from an activity file. Cumulative distance is
//! computed upstream and must be non-decreasing; this module validates that
//! contract and provides the interpolation primitives the split and
//! best-effort calculators are built on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single recorded sample on a track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackPoint {
    /// Absolute sample timestamp
    pub timestamp: DateTime<Utc>,
    /// GPS latitude in degrees
    pub latitude: f64,
    /// GPS longitude in degrees
    pub longitude: f64,
    /// Cumulative distance from track start in meters (non-decreasing)
    pub cumulative_distance_m: f64,
    /// Elevation in meters
    pub elevation_m: Option<f64>,
    /// Heart rate in BPM
    pub heart_rate_bpm: Option<u8>,
    /// Cadence in RPM
    pub cadence_rpm: Option<u8>,
    /// Power in watts
    pub power_watts: Option<u16>,
}

/// Ordered sample sequence with summary totals.
///
/// Immutable once produced: a crop replaces the whole track, it never
/// mutates samples in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    /// Samples ordered by timestamp
    pub points: Vec<TrackPoint>,
    /// Total distance in meters
    pub total_distance_m: f64,
    /// Total duration in seconds
    pub total_duration_s: f64,
    /// Timestamp of the first sample
    pub start_time: DateTime<Utc>,
}

impl Track {
    /// Build a track from an ordered sample sequence, validating the
    /// producer contract (non-empty, ordered timestamps, non-decreasing
    /// cumulative distance). Totals are derived from the samples.
    pub fn from_points(points: Vec<TrackPoint>) -> Result<Self, TrackError> {
        let first = points.first().ok_or(TrackError::Empty)?;
        let start_time = first.timestamp;
        let base_distance = first.cumulative_distance_m;

        for i in 1..points.len() {
            if points[i].timestamp < points[i - 1].timestamp {
                return Err(TrackError::OutOfOrderTimestamp { index: i });
            }
            if points[i].cumulative_distance_m < points[i - 1].cumulative_distance_m {
                return Err(TrackError::NonMonotonicDistance { index: i });
            }
        }

        let last = points.last().ok_or(TrackError::Empty)?;
        let total_distance_m = last.cumulative_distance_m - base_distance;
        let total_duration_s = (last.timestamp - start_time).num_milliseconds() as f64 / 1000.0;

        Ok(Self {
            points,
            total_distance_m,
            total_duration_s,
            start_time,
        })
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the track has no samples.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Elapsed seconds of sample `index` since track start.
    pub fn elapsed_s(&self, index: usize) -> f64 {
        (self.points[index].timestamp - self.start_time).num_milliseconds() as f64 / 1000.0
    }

    /// Cumulative distance of sample `index` relative to the track start.
    pub fn distance_m(&self, index: usize) -> f64 {
        self.points[index].cumulative_distance_m - self.points[0].cumulative_distance_m
    }

    /// Total elevation gain and loss in meters from the elevation samples.
    ///
    /// Samples without elevation are skipped; a track without any elevation
    /// data yields (0, 0).
    pub fn elevation_aggregates(&self) -> (f64, f64) {
        let mut gain = 0.0;
        let mut loss = 0.0;
        let mut previous: Option<f64> = None;

        for point in &self.points {
            if let Some(elevation) = point.elevation_m {
                if let Some(prev) = previous {
                    let delta = elevation - prev;
                    if delta > 0.0 {
                        gain += delta;
                    } else {
                        loss += -delta;
                    }
                }
                previous = Some(elevation);
            }
        }

        (gain, loss)
    }
}

/// Monotone interpolation cursor over a track.
///
/// Answers "at what elapsed time did the track reach distance d" with linear
/// interpolation between the bracketing samples. Queries must be
/// non-decreasing, which keeps a full scan at O(n) total.
pub struct DistanceCursor<'a> {
    track: &'a Track,
    index: usize,
}

impl<'a> DistanceCursor<'a> {
    /// Create a cursor positioned at the track start.
    pub fn new(track: &'a Track) -> Self {
        Self { track, index: 0 }
    }

    /// Interpolated elapsed seconds at cumulative distance `distance_m`
    /// (relative to the track start). Out-of-range distances clamp to the
    /// first/last sample.
    pub fn time_at(&mut self, distance_m: f64) -> f64 {
        let points = &self.track.points;
        let n = points.len();

        while self.index + 1 < n && self.track.distance_m(self.index + 1) < distance_m {
            self.index += 1;
        }

        if self.index + 1 >= n {
            return self.track.elapsed_s(n - 1);
        }

        let d0 = self.track.distance_m(self.index);
        let d1 = self.track.distance_m(self.index + 1);
        let t0 = self.track.elapsed_s(self.index);
        let t1 = self.track.elapsed_s(self.index + 1);

        if distance_m <= d0 {
            return t0;
        }
        // Duplicate cumulative distances (stationary samples): fall back to
        // the earlier bracketing sample's time rather than dividing by zero.
        if d1 <= d0 {
            return t0;
        }

        t0 + (distance_m - d0) / (d1 - d0) * (t1 - t0)
    }

    /// Index of the sample at or before the last queried distance.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Track producer contract violations.
#[derive(Debug, Error)]
pub enum TrackError {
    /// The sample sequence is empty.
    #[error("Track has no samples")]
    Empty,

    /// A sample's timestamp precedes its predecessor's.
    #[error("Sample {index} is out of timestamp order")]
    OutOfOrderTimestamp { index: usize },

    /// Cumulative distance decreased between two samples. Filtering GPS
    /// corrections is the track producer's responsibility; this engine
    /// fails fast instead of silently misbehaving.
    #[error("Cumulative distance decreases at sample {index}")]
    NonMonotonicDistance { index: usize },
}
