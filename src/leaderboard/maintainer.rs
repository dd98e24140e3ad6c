//! Leaderboard maintainer.
//!
//! Keeps one global-fastest best-effort record per standard distance,
//! preserving the invariant
//! `record[d] = min over qualifying workouts w of best_effort(w, d)`
//! across workout creation, cropping, and deletion. Every mutation path in
//! the engine goes through one of the three hooks here instead of
//! re-implementing its own rescan.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

use crate::efforts::{find_best_effort, standard_candidates, BestEffortCandidate};
use crate::leaderboard::records::BestEffortRecord;
use crate::storage::{Database, DatabaseError};
use crate::track::{standard_distance, StandardDistance, Track, STANDARD_DISTANCES};
use crate::workouts::Workout;

/// Outcome of a full rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildSummary {
    /// Distances whose record was written
    pub written: usize,
    /// Distances left without a qualifying workout
    pub cleared: usize,
    /// Whether the rebuild stopped early on cancellation
    pub cancelled: bool,
}

/// Maintains the per-distance best-effort leaderboard.
pub struct LeaderboardMaintainer {
    db: Arc<Mutex<Database>>,
}

impl LeaderboardMaintainer {
    /// Create a maintainer over a shared database.
    pub fn new(db: Arc<Mutex<Database>>) -> Self {
        Self { db }
    }

    /// Point-in-time snapshot of all records, shortest distance first.
    pub fn snapshot(&self) -> Result<Vec<BestEffortRecord>, LeaderboardError> {
        let db = lock(&self.db);
        Ok(db.list_records()?)
    }

    /// Full recalculation of every standard distance.
    pub fn rebuild_all(&self) -> Result<RebuildSummary, LeaderboardError> {
        self.rebuild_all_with_cancel(&AtomicBool::new(false))
    }

    /// Full recalculation, stopping between distances when `cancel` is set.
    ///
    /// Each distance's replacement record is written in its own statement,
    /// so a cancelled rebuild leaves every already-written distance
    /// individually consistent and the rest untouched.
    pub fn rebuild_all_with_cancel(
        &self,
        cancel: &AtomicBool,
    ) -> Result<RebuildSummary, LeaderboardError> {
        let mut summary = RebuildSummary::default();

        for distance in STANDARD_DISTANCES {
            if cancel.load(Ordering::Relaxed) {
                summary.cancelled = true;
                tracing::info!(
                    written = summary.written,
                    "leaderboard rebuild cancelled"
                );
                return Ok(summary);
            }

            // Lock per distance so snapshot readers interleave with a
            // long-running rebuild.
            let db = lock(&self.db);
            match self.rescan_distance(&db, distance)? {
                Some(_) => summary.written += 1,
                None => summary.cleared += 1,
            }
        }

        tracing::info!(
            written = summary.written,
            cleared = summary.cleared,
            "leaderboard rebuilt"
        );
        Ok(summary)
    }

    /// A new workout can only improve or tie existing records, never
    /// invalidate them: compare its candidates against the stored rows and
    /// replace only when strictly faster. No rescan of other workouts.
    pub fn on_workout_created(&self, workout_id: Uuid) -> Result<(), LeaderboardError> {
        let db = lock(&self.db);
        let (workout, track) = load_workout_track(&db, workout_id)?;
        let candidates = standard_candidates(&track, workout.id, workout.started_at);

        for candidate in &candidates {
            self.apply_if_faster(&db, candidate)?;
        }

        Ok(())
    }

    /// Bulk-import batching: one candidate pass over the new workouts and a
    /// single merge against the stored records, instead of a per-workout
    /// rescan.
    pub fn on_workouts_created(&self, workout_ids: &[Uuid]) -> Result<(), LeaderboardError> {
        let db = lock(&self.db);
        let mut best_new: Vec<Option<BestEffortCandidate>> =
            vec![None; STANDARD_DISTANCES.len()];

        for &workout_id in workout_ids {
            let (workout, track) = match load_workout_track(&db, workout_id) {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::warn!(%workout_id, error = %e, "skipping workout in bulk leaderboard update");
                    continue;
                }
            };

            for candidate in standard_candidates(&track, workout.id, workout.started_at) {
                let slot_index = STANDARD_DISTANCES
                    .iter()
                    .position(|d| d.name == candidate.distance_name);
                if let Some(i) = slot_index {
                    merge_candidate(&mut best_new[i], candidate);
                }
            }
        }

        for candidate in best_new.into_iter().flatten() {
            self.apply_if_faster(&db, &candidate)?;
        }

        Ok(())
    }

    /// The deleted workout may have held records; every such distance is
    /// rescanned over the remaining workouts.
    pub fn on_workout_deleted(&self, workout_id: Uuid) -> Result<(), LeaderboardError> {
        let db = lock(&self.db);
        let held = db.record_distances_for_workout(&workout_id)?;

        for name in held {
            let distance = standard_distance(&name)
                .ok_or_else(|| LeaderboardError::UnknownDistance(name.clone()))?;
            self.rescan_distance(&db, distance)?;
        }

        Ok(())
    }

    /// Re-validate every record the workout held before the crop.
    ///
    /// `held_distances` must be captured before the crop runs; the crop
    /// destroys the information needed to recompute it. A matching
    /// workout id alone is not proof the record still stands: when the
    /// cropped track can no longer achieve the stored time (the crop
    /// removed the fast segment) the record is vacated and the distance
    /// rescanned.
    pub fn on_workout_cropped(
        &self,
        workout_id: Uuid,
        held_distances: &[String],
    ) -> Result<(), LeaderboardError> {
        let db = lock(&self.db);

        for name in held_distances {
            let distance = standard_distance(name)
                .ok_or_else(|| LeaderboardError::UnknownDistance(name.clone()))?;

            let stored = match db.get_record(name)? {
                Some(record) if record.workout_id == workout_id => record,
                // Record already replaced or removed; nothing to validate.
                _ => continue,
            };

            let recomputed = match load_workout_track(&db, workout_id) {
                Ok((workout, track)) => find_best_effort(&track, distance.meters).map(|effort| {
                    BestEffortCandidate {
                        distance_name: name.clone(),
                        distance_m: distance.meters,
                        time_s: effort.time_s,
                        workout_id,
                        workout_date: workout.started_at,
                    }
                }),
                Err(e) => {
                    tracing::warn!(%workout_id, error = %e, "cropped workout unreadable; vacating record");
                    None
                }
            };

            match recomputed {
                Some(candidate) if candidate.time_s <= stored.time_s => {
                    // Still achievable on the cropped track; rewrite with
                    // the recomputed time.
                    db.replace_record(&BestEffortRecord::from_candidate(&candidate))?;
                }
                _ => {
                    tracing::info!(
                        %workout_id,
                        distance = name.as_str(),
                        "record no longer achievable after crop; rescanning"
                    );
                    self.rescan_distance(&db, distance)?;
                }
            }
        }

        Ok(())
    }

    /// Rescan one distance over all qualifying workouts and replace its
    /// record wholesale. Returns the new record, or `None` when no workout
    /// qualifies (the record row is removed).
    fn rescan_distance(
        &self,
        db: &Database,
        distance: &StandardDistance,
    ) -> Result<Option<BestEffortRecord>, LeaderboardError> {
        let mut best: Option<BestEffortCandidate> = None;

        // Ordered by start date then id: merge keeps the earliest on ties,
        // so repeated rescans are deterministic and idempotent.
        for workout_id in db.qualifying_workout_ids(distance.meters)? {
            let (workout, track) = match load_workout_track(db, workout_id) {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::warn!(%workout_id, error = %e, "skipping workout during leaderboard rescan");
                    continue;
                }
            };

            if let Some(effort) = find_best_effort(&track, distance.meters) {
                merge_candidate(
                    &mut best,
                    BestEffortCandidate {
                        distance_name: distance.name.to_string(),
                        distance_m: distance.meters,
                        time_s: effort.time_s,
                        workout_id: workout.id,
                        workout_date: workout.started_at,
                    },
                );
            }
        }

        match best {
            Some(candidate) => {
                let record = BestEffortRecord::from_candidate(&candidate);
                db.replace_record(&record)?;
                Ok(Some(record))
            }
            None => {
                db.delete_record(distance.name)?;
                Ok(None)
            }
        }
    }

    fn apply_if_faster(
        &self,
        db: &Database,
        candidate: &BestEffortCandidate,
    ) -> Result<(), LeaderboardError> {
        let current = db.get_record(&candidate.distance_name)?;
        let is_faster = match &current {
            Some(record) => candidate.time_s < record.time_s,
            None => true,
        };

        if is_faster {
            db.replace_record(&BestEffortRecord::from_candidate(candidate))?;
            tracing::debug!(
                distance = candidate.distance_name.as_str(),
                time_s = candidate.time_s,
                workout_id = %candidate.workout_id,
                "leaderboard record updated"
            );
        }

        Ok(())
    }
}

/// Keep the faster candidate; on equal times the earlier workout date, then
/// the smaller workout id.
fn merge_candidate(slot: &mut Option<BestEffortCandidate>, candidate: BestEffortCandidate) {
    match slot {
        None => *slot = Some(candidate),
        Some(current) => {
            let replace = candidate.time_s < current.time_s
                || (candidate.time_s == current.time_s
                    && (candidate.workout_date < current.workout_date
                        || (candidate.workout_date == current.workout_date
                            && candidate.workout_id < current.workout_id)));
            if replace {
                *slot = Some(candidate);
            }
        }
    }
}

fn load_workout_track(
    db: &Database,
    workout_id: Uuid,
) -> Result<(Workout, Track), LeaderboardError> {
    let workout = db
        .get_workout(&workout_id)?
        .ok_or(LeaderboardError::WorkoutNotFound(workout_id))?;
    let track = db
        .get_track(&workout_id)?
        .ok_or(LeaderboardError::WorkoutNotFound(workout_id))?;
    Ok((workout, track))
}

fn lock(db: &Arc<Mutex<Database>>) -> std::sync::MutexGuard<'_, Database> {
    db.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Leaderboard maintenance errors.
#[derive(Debug, thiserror::Error)]
pub enum LeaderboardError {
    #[error("Workout not found: {0}")]
    WorkoutNotFound(Uuid),

    #[error("Unknown standard distance: {0}")]
    UnknownDistance(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),
}
