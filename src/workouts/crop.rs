//! Crop operator.
//!
//! Truncates a track by elapsed time. The track is replaced wholesale; the
//! retained samples are re-baselined so the cropped track again starts at
//! zero elapsed time and zero cumulative distance.

use thiserror::Error;

use crate::track::{Track, TrackError, TrackPoint};

/// Crop a track, trimming `start_trim_s` seconds from the front and
/// `end_trim_s` from the back.
///
/// Validation happens before anything else: negative trims and trims that
/// would consume the entire workout are rejected. Samples whose elapsed
/// time lies in `[start_trim_s, total_duration_s - end_trim_s]` are
/// retained; totals and summary aggregates are recomputed from them.
pub fn crop_track(
    track: &Track,
    start_trim_s: f64,
    end_trim_s: f64,
) -> Result<Track, CropError> {
    if start_trim_s < 0.0 || end_trim_s < 0.0 {
        return Err(CropError::NegativeTrim);
    }
    if start_trim_s + end_trim_s >= track.total_duration_s {
        return Err(CropError::OverTrim);
    }

    let cutoff = track.total_duration_s - end_trim_s;
    let mut retained: Vec<TrackPoint> = Vec::new();
    let mut base_distance = 0.0;

    for (i, point) in track.points.iter().enumerate() {
        let elapsed = track.elapsed_s(i);
        if elapsed < start_trim_s || elapsed > cutoff {
            continue;
        }
        if retained.is_empty() {
            base_distance = point.cumulative_distance_m;
        }
        let mut point = point.clone();
        point.cumulative_distance_m -= base_distance;
        retained.push(point);
    }

    Track::from_points(retained).map_err(|e| match e {
        TrackError::Empty => CropError::EmptyRange,
        other => CropError::InvalidTrack(other),
    })
}

/// Crop validation errors.
#[derive(Debug, Error)]
pub enum CropError {
    /// A trim value was negative.
    #[error("Trim values must be non-negative")]
    NegativeTrim,

    /// The trims would remove the entire workout.
    #[error("Crop would remove the entire workout")]
    OverTrim,

    /// The trims are valid but no samples fall inside the retained range.
    #[error("No samples remain in the cropped range")]
    EmptyRange,

    /// The retained samples do not form a valid track.
    #[error("Cropped track is invalid: {0}")]
    InvalidTrack(#[source] TrackError),
}
