//! Workout service.
//!
//! Orchestrates the primary CRUD operations (import, crop, delete) and the
//! derived-metric recomputations that follow them. The primary operation is
//! authoritative: split regeneration, leaderboard maintenance, and the
//! relative-effort hook are each caught at their own boundary and logged as
//! non-fatal warnings, so CRUD availability wins over immediate analytics
//! consistency.

use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use uuid::Uuid;

use crate::leaderboard::{LeaderboardError, LeaderboardMaintainer};
use crate::splits::{compute_splits, Split, SplitUnit};
use crate::storage::{Database, DatabaseError};
use crate::track::Track;
use crate::workouts::crop::{crop_track, CropError};
use crate::workouts::types::Workout;

/// External relative-effort recalculation, invoked after a crop when
/// heart-rate zones are configured. Not part of this engine.
pub trait RelativeEffortHook: Send + Sync {
    /// Recalculate the relative effort for a workout.
    fn recalculate(&self, workout_id: Uuid) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Primary CRUD surface over workouts with derived-metric maintenance.
pub struct WorkoutService {
    db: Arc<Mutex<Database>>,
    leaderboard: LeaderboardMaintainer,
    split_unit: SplitUnit,
    relative_effort: Option<Box<dyn RelativeEffortHook>>,
}

impl WorkoutService {
    /// Create a service over a shared database.
    pub fn new(db: Arc<Mutex<Database>>, split_unit: SplitUnit) -> Self {
        let leaderboard = LeaderboardMaintainer::new(Arc::clone(&db));
        Self {
            db,
            leaderboard,
            split_unit,
            relative_effort: None,
        }
    }

    /// Attach a relative-effort recalculation hook.
    pub fn with_relative_effort_hook(mut self, hook: Box<dyn RelativeEffortHook>) -> Self {
        self.relative_effort = Some(hook);
        self
    }

    /// The leaderboard maintainer backing this service.
    pub fn leaderboard(&self) -> &LeaderboardMaintainer {
        &self.leaderboard
    }

    /// Current split unit preference.
    pub fn split_unit(&self) -> SplitUnit {
        self.split_unit
    }

    /// Import one workout from a canonical track.
    pub fn import_workout(
        &self,
        name: Option<String>,
        track: Track,
    ) -> Result<Workout, ServiceError> {
        let workout = self.persist_workout(name, &track)?;

        if let Err(e) = self.leaderboard.on_workout_created(workout.id) {
            warn_derived("leaderboard update", workout.id, &e);
        }

        Ok(workout)
    }

    /// Import a batch of workouts, deferring leaderboard maintenance to a
    /// single pass after all rows exist.
    pub fn import_workouts(
        &self,
        batch: Vec<(Option<String>, Track)>,
    ) -> Result<Vec<Workout>, ServiceError> {
        let mut workouts = Vec::with_capacity(batch.len());
        for (name, track) in batch {
            workouts.push(self.persist_workout(name, &track)?);
        }

        let ids: Vec<Uuid> = workouts.iter().map(|w| w.id).collect();
        if let Err(e) = self.leaderboard.on_workouts_created(&ids) {
            tracing::warn!(count = ids.len(), error = %e, "bulk leaderboard update failed");
        }

        Ok(workouts)
    }

    /// Crop a workout's track by elapsed time and refresh everything
    /// derived from it.
    ///
    /// Validation rejects malformed trims before any mutation. The set of
    /// distances the workout holds records for is captured before the crop,
    /// because the crop destroys the information needed to recompute it.
    pub fn crop_workout(
        &self,
        workout_id: Uuid,
        start_trim_s: f64,
        end_trim_s: f64,
    ) -> Result<Workout, ServiceError> {
        let (workout, cropped, held) = {
            let mut db = self.lock_db();

            let mut workout = db
                .get_workout(&workout_id)?
                .ok_or(ServiceError::WorkoutNotFound(workout_id))?;
            let track = db
                .get_track(&workout_id)?
                .ok_or(ServiceError::WorkoutNotFound(workout_id))?;

            let cropped = crop_track(&track, start_trim_s, end_trim_s)?;
            let held = db.record_distances_for_workout(&workout_id)?;

            workout.refresh_from_track(&cropped);
            db.replace_track(&workout_id, &cropped)?;
            db.update_workout(&workout)?;

            (workout, cropped, held)
        };

        self.regenerate_splits(workout_id, &cropped);

        if let Err(e) = self.leaderboard.on_workout_cropped(workout_id, &held) {
            warn_derived("leaderboard update", workout_id, &e);
        }

        if let Some(hook) = &self.relative_effort {
            if let Err(e) = hook.recalculate(workout_id) {
                tracing::warn!(%workout_id, error = %e, "relative-effort recalculation failed");
            }
        }

        Ok(workout)
    }

    /// Delete a workout and rescan any records it held.
    pub fn delete_workout(&self, workout_id: Uuid) -> Result<(), ServiceError> {
        {
            let mut db = self.lock_db();
            match db.delete_workout(&workout_id) {
                Ok(()) => {}
                Err(DatabaseError::NotFound(_)) => {
                    return Err(ServiceError::WorkoutNotFound(workout_id));
                }
                Err(e) => return Err(e.into()),
            }
        }

        if let Err(e) = self.leaderboard.on_workout_deleted(workout_id) {
            warn_derived("leaderboard update", workout_id, &e);
        }

        Ok(())
    }

    /// Change the split unit preference and regenerate every workout's
    /// splits wholesale.
    pub fn set_split_unit(&mut self, unit: SplitUnit) -> Result<(), ServiceError> {
        if unit == self.split_unit {
            return Ok(());
        }
        self.split_unit = unit;

        let workouts = {
            let db = self.lock_db();
            db.list_workouts()?
        };

        for workout in workouts {
            let track = {
                let db = self.lock_db();
                db.get_track(&workout.id)
            };
            match track {
                Ok(Some(track)) => self.regenerate_splits(workout.id, &track),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(workout_id = %workout.id, error = %e, "skipping split regeneration");
                }
            }
        }

        Ok(())
    }

    /// Get a workout by ID.
    pub fn get_workout(&self, workout_id: Uuid) -> Result<Option<Workout>, ServiceError> {
        let db = self.lock_db();
        Ok(db.get_workout(&workout_id)?)
    }

    /// List all workouts, newest first.
    pub fn list_workouts(&self) -> Result<Vec<Workout>, ServiceError> {
        let db = self.lock_db();
        Ok(db.list_workouts()?)
    }

    /// Stored splits for a workout.
    pub fn splits(&self, workout_id: Uuid) -> Result<Vec<Split>, ServiceError> {
        let db = self.lock_db();
        Ok(db.get_splits(&workout_id)?)
    }

    /// Insert the workout summary row and its track. This is the primary
    /// mutation; split persistence afterward is derived and best-effort.
    fn persist_workout(
        &self,
        name: Option<String>,
        track: &Track,
    ) -> Result<Workout, ServiceError> {
        let workout = Workout::from_track(name, track);

        {
            let mut db = self.lock_db();
            db.insert_workout(&workout)?;
            db.replace_track(&workout.id, track)?;
        }

        self.regenerate_splits(workout.id, track);

        Ok(workout)
    }

    /// Recompute and store a workout's splits; failures are logged, never
    /// propagated.
    fn regenerate_splits(&self, workout_id: Uuid, track: &Track) {
        let splits = compute_splits(track, self.split_unit.meters());
        let mut db = self.lock_db();
        if let Err(e) = db.replace_splits(&workout_id, &splits) {
            tracing::warn!(%workout_id, error = %e, "split regeneration failed");
        }
    }

    fn lock_db(&self) -> std::sync::MutexGuard<'_, Database> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn warn_derived(what: &str, workout_id: Uuid, error: &LeaderboardError) {
    tracing::warn!(%workout_id, error = %error, "derived-metric {what} failed; primary operation unaffected");
}

/// Workout service errors.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Workout not found: {0}")]
    WorkoutNotFound(Uuid),

    #[error(transparent)]
    Validation(#[from] CropError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}
