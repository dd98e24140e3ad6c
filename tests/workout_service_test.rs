//! Workout lifecycle through the service layer.

mod common;

use std::sync::{Arc, Mutex};

use common::{constant_pace_track, service, start_time};
use runmetrics::splits::SplitUnit;
use runmetrics::storage::Database;
use runmetrics::workouts::{RelativeEffortHook, ServiceError, WorkoutService};
use uuid::Uuid;

#[test]
fn test_import_persists_workout_and_derived_data() {
    let service = service();
    let track = constant_pace_track(start_time(), 5000.0, 1500.0, 10.0);
    let workout = service
        .import_workout(Some("tempo".into()), track)
        .unwrap();

    let stored = service.get_workout(workout.id).unwrap().unwrap();
    assert_eq!(stored.name.as_deref(), Some("tempo"));
    assert!((stored.total_distance_m - 5000.0).abs() < 1e-6);
    assert!((stored.total_duration_s - 1500.0).abs() < 1e-6);
    assert!((stored.avg_pace_s.unwrap() - 300.0).abs() < 1e-6);

    let splits = service.splits(workout.id).unwrap();
    assert_eq!(splits.len(), 5);
}

#[test]
fn test_list_workouts_newest_first() {
    let service = service();
    let first = service
        .import_workout(None, constant_pace_track(start_time(), 3000.0, 900.0, 10.0))
        .unwrap();
    let second = service
        .import_workout(
            None,
            constant_pace_track(start_time() + chrono::Duration::days(1), 3000.0, 900.0, 10.0),
        )
        .unwrap();

    let listed = service.list_workouts().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, second.id);
    assert_eq!(listed[1].id, first.id);
}

#[test]
fn test_crop_updates_summary_and_splits() {
    let service = service();
    let track = constant_pace_track(start_time(), 5000.0, 1500.0, 10.0);
    let workout = service.import_workout(None, track).unwrap();

    let cropped = service.crop_workout(workout.id, 150.0, 150.0).unwrap();
    assert!((cropped.total_duration_s - 1200.0).abs() < 1e-6);
    assert!((cropped.total_distance_m - 4000.0).abs() < 1e-6);

    let splits = service.splits(workout.id).unwrap();
    assert_eq!(splits.len(), 4);
}

#[test]
fn test_crop_rejects_negative_trim() {
    let service = service();
    let track = constant_pace_track(start_time(), 3000.0, 900.0, 10.0);
    let workout = service.import_workout(None, track).unwrap();

    let result = service.crop_workout(workout.id, -1.0, 0.0);
    assert!(matches!(result, Err(ServiceError::Validation(_))));

    // The workout is untouched.
    let stored = service.get_workout(workout.id).unwrap().unwrap();
    assert!((stored.total_duration_s - 900.0).abs() < 1e-6);
}

#[test]
fn test_crop_rejects_trims_consuming_whole_workout() {
    let service = service();
    let track = constant_pace_track(start_time(), 3000.0, 900.0, 10.0);
    let workout = service.import_workout(None, track).unwrap();

    let result = service.crop_workout(workout.id, 500.0, 400.0);
    assert!(matches!(result, Err(ServiceError::Validation(_))));
}

#[test]
fn test_crop_unknown_workout_is_not_found() {
    let service = service();
    let result = service.crop_workout(Uuid::new_v4(), 10.0, 0.0);
    assert!(matches!(result, Err(ServiceError::WorkoutNotFound(_))));
}

#[test]
fn test_delete_removes_workout_and_splits() {
    let service = service();
    let track = constant_pace_track(start_time(), 3000.0, 900.0, 10.0);
    let workout = service.import_workout(None, track).unwrap();

    service.delete_workout(workout.id).unwrap();

    assert!(service.get_workout(workout.id).unwrap().is_none());
    assert!(service.splits(workout.id).unwrap().is_empty());
}

#[test]
fn test_delete_unknown_workout_is_not_found() {
    let service = service();
    let result = service.delete_workout(Uuid::new_v4());
    assert!(matches!(result, Err(ServiceError::WorkoutNotFound(_))));
}

#[test]
fn test_changing_split_unit_regenerates_all_splits() {
    let mut service = service();
    let track = constant_pace_track(start_time(), 5000.0, 1500.0, 10.0);
    let workout = service.import_workout(None, track).unwrap();
    assert_eq!(service.splits(workout.id).unwrap().len(), 5);

    service.set_split_unit(SplitUnit::Imperial).unwrap();

    let splits = service.splits(workout.id).unwrap();
    assert_eq!(splits.len(), 4);
    assert!((splits[0].distance_m - 1609.344).abs() < 1e-6);
}

#[test]
fn test_batch_import_persists_every_workout() {
    let service = service();
    let batch = vec![
        (
            Some("a".to_string()),
            constant_pace_track(start_time(), 3000.0, 900.0, 10.0),
        ),
        (
            Some("b".to_string()),
            constant_pace_track(start_time() + chrono::Duration::days(1), 4000.0, 1100.0, 10.0),
        ),
    ];
    let workouts = service.import_workouts(batch).unwrap();

    assert_eq!(workouts.len(), 2);
    assert_eq!(service.list_workouts().unwrap().len(), 2);
}

struct RecordingHook {
    calls: Arc<Mutex<Vec<Uuid>>>,
}

impl RelativeEffortHook for RecordingHook {
    fn recalculate(
        &self,
        workout_id: Uuid,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.calls.lock().unwrap().push(workout_id);
        Ok(())
    }
}

struct FailingHook;

impl RelativeEffortHook for FailingHook {
    fn recalculate(
        &self,
        _workout_id: Uuid,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Err("heart-rate zones unavailable".into())
    }
}

#[test]
fn test_crop_invokes_relative_effort_hook() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let service = service().with_relative_effort_hook(Box::new(RecordingHook {
        calls: Arc::clone(&calls),
    }));

    let track = constant_pace_track(start_time(), 5000.0, 1500.0, 10.0);
    let workout = service.import_workout(None, track).unwrap();
    assert!(calls.lock().unwrap().is_empty());

    service.crop_workout(workout.id, 60.0, 0.0).unwrap();
    assert_eq!(calls.lock().unwrap().as_slice(), &[workout.id]);
}

#[test]
fn test_failing_hook_does_not_fail_the_crop() {
    let service = service().with_relative_effort_hook(Box::new(FailingHook));
    let track = constant_pace_track(start_time(), 5000.0, 1500.0, 10.0);
    let workout = service.import_workout(None, track).unwrap();

    let cropped = service.crop_workout(workout.id, 60.0, 60.0).unwrap();
    assert!((cropped.total_duration_s - 1380.0).abs() < 1e-6);

    // The crop's persisted effects are intact despite the hook failure.
    let stored = service.get_workout(workout.id).unwrap().unwrap();
    assert!((stored.total_duration_s - 1380.0).abs() < 1e-6);
}

#[test]
fn test_workouts_survive_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("runmetrics.db");

    let workout_id = {
        let db = Database::open(&path).unwrap();
        let service = WorkoutService::new(Arc::new(Mutex::new(db)), SplitUnit::Metric);
        let track = constant_pace_track(start_time(), 5000.0, 1500.0, 10.0);
        service.import_workout(Some("persisted".into()), track).unwrap().id
    };

    let db = Database::open(&path).unwrap();
    let service = WorkoutService::new(Arc::new(Mutex::new(db)), SplitUnit::Metric);

    let stored = service.get_workout(workout_id).unwrap().unwrap();
    assert_eq!(stored.name.as_deref(), Some("persisted"));
    assert_eq!(service.splits(workout_id).unwrap().len(), 5);

    let records = service.leaderboard().snapshot().unwrap();
    assert!(records.iter().any(|r| r.distance_name == "5K"));
}
