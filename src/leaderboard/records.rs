//! Leaderboard record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::efforts::BestEffortCandidate;

/// Persisted leaderboard row: the single global-fastest best effort for one
/// standard distance across the whole workout collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestEffortRecord {
    /// Standard distance name ("5K", "Marathon", ...)
    pub distance_name: String,
    /// Target distance in meters
    pub distance_m: f64,
    /// Record time in seconds
    pub time_s: f64,
    /// Workout holding the record
    pub workout_id: Uuid,
    /// Start time of that workout
    pub workout_date: DateTime<Utc>,
    /// When this row was last written
    pub updated_at: DateTime<Utc>,
}

impl BestEffortRecord {
    /// Promote a candidate to a record row.
    pub fn from_candidate(candidate: &BestEffortCandidate) -> Self {
        Self {
            distance_name: candidate.distance_name.clone(),
            distance_m: candidate.distance_m,
            time_s: candidate.time_s,
            workout_id: candidate.workout_id,
            workout_date: candidate.workout_date,
            updated_at: Utc::now(),
        }
    }
}
