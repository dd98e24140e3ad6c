//! Database operations using rusqlite.
//!
//! One connection, system of record for workouts, track points, splits,
//! and best-effort leaderboard records. Derived rows (splits, records) are
//! replaced wholesale inside transactions; nothing is patched in place.

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

use crate::leaderboard::BestEffortRecord;
use crate::splits::Split;
use crate::storage::schema::{CURRENT_VERSION, SCHEMA, SCHEMA_VERSION_TABLE};
use crate::track::{Track, TrackPoint};
use crate::workouts::Workout;

/// Database wrapper for SQLite operations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create a database at the given path.
    pub fn open(path: &PathBuf) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::IoError(e.to_string()))?;
        }

        let conn =
            Connection::open(path).map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        let db = Self { conn };
        db.initialize()?;

        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        let db = Self { conn };
        db.initialize()?;

        Ok(db)
    }

    /// Initialize the database schema.
    fn initialize(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(SCHEMA_VERSION_TABLE)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

        let current_version = self.get_schema_version()?;

        if current_version < CURRENT_VERSION {
            self.migrate(current_version)?;
        }

        Ok(())
    }

    /// Get the current schema version.
    fn get_schema_version(&self) -> Result<i32, DatabaseError> {
        let result: SqliteResult<i32> = self.conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        );

        match result {
            Ok(version) => Ok(version),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
            Err(e) => Err(DatabaseError::QueryFailed(e.to_string())),
        }
    }

    /// Run database migrations.
    fn migrate(&self, from_version: i32) -> Result<(), DatabaseError> {
        if from_version < 1 {
            self.conn
                .execute_batch(SCHEMA)
                .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

            self.conn
                .execute(
                    "INSERT INTO schema_version (version, applied_at) VALUES (?, datetime('now'))",
                    [CURRENT_VERSION],
                )
                .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

            tracing::info!("Database migrated to version {}", CURRENT_VERSION);
        }

        Ok(())
    }

    // ========== Workout CRUD ==========

    /// Insert a new workout summary row.
    pub fn insert_workout(&self, workout: &Workout) -> Result<(), DatabaseError> {
        self.conn
            .execute(
                "INSERT INTO workouts (id, name, started_at, total_distance_m, total_duration_s,
                 avg_pace_s, elevation_gain_m, elevation_loss_m, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    workout.id.to_string(),
                    workout.name,
                    workout.started_at.to_rfc3339(),
                    workout.total_distance_m,
                    workout.total_duration_s,
                    workout.avg_pace_s,
                    workout.elevation_gain_m,
                    workout.elevation_loss_m,
                    workout.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    /// Get a workout by ID.
    pub fn get_workout(&self, id: &Uuid) -> Result<Option<Workout>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, name, started_at, total_distance_m, total_duration_s, avg_pace_s,
                 elevation_gain_m, elevation_loss_m, created_at FROM workouts WHERE id = ?1",
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let result = stmt.query_row(params![id.to_string()], workout_row);

        match result {
            Ok(row) => Ok(Some(row.into_workout()?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DatabaseError::QueryFailed(e.to_string())),
        }
    }

    /// List all workouts, newest first.
    pub fn list_workouts(&self) -> Result<Vec<Workout>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, name, started_at, total_distance_m, total_duration_s, avg_pace_s,
                 elevation_gain_m, elevation_loss_m, created_at FROM workouts
                 ORDER BY started_at DESC",
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map([], workout_row)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut workouts = Vec::new();
        for row in rows {
            let row = row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            workouts.push(row.into_workout()?);
        }

        Ok(workouts)
    }

    /// IDs of workouts whose total distance reaches `min_distance_m`,
    /// ordered by start date so rescans are deterministic.
    pub fn qualifying_workout_ids(
        &self,
        min_distance_m: f64,
    ) -> Result<Vec<Uuid>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id FROM workouts WHERE total_distance_m >= ?1
                 ORDER BY started_at ASC, id ASC",
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map(params![min_distance_m], |row| row.get::<_, String>(0))
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut ids = Vec::new();
        for row in rows {
            let id = row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            ids.push(
                Uuid::parse_str(&id)
                    .map_err(|e| DatabaseError::DeserializationError(e.to_string()))?,
            );
        }

        Ok(ids)
    }

    /// Update a workout summary row.
    pub fn update_workout(&self, workout: &Workout) -> Result<(), DatabaseError> {
        let rows_affected = self
            .conn
            .execute(
                "UPDATE workouts SET name = ?2, started_at = ?3, total_distance_m = ?4,
                 total_duration_s = ?5, avg_pace_s = ?6, elevation_gain_m = ?7,
                 elevation_loss_m = ?8 WHERE id = ?1",
                params![
                    workout.id.to_string(),
                    workout.name,
                    workout.started_at.to_rfc3339(),
                    workout.total_distance_m,
                    workout.total_duration_s,
                    workout.avg_pace_s,
                    workout.elevation_gain_m,
                    workout.elevation_loss_m,
                ],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        if rows_affected == 0 {
            return Err(DatabaseError::NotFound(format!("Workout {}", workout.id)));
        }

        Ok(())
    }

    /// Delete a workout with its track points and splits in one transaction.
    ///
    /// Leaderboard records naming the workout are left for the maintainer's
    /// deleted-hook to rescan.
    pub fn delete_workout(&mut self, id: &Uuid) -> Result<(), DatabaseError> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        tx.execute(
            "DELETE FROM track_points WHERE workout_id = ?1",
            params![id.to_string()],
        )
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        tx.execute(
            "DELETE FROM splits WHERE workout_id = ?1",
            params![id.to_string()],
        )
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows_affected = tx
            .execute("DELETE FROM workouts WHERE id = ?1", params![id.to_string()])
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        if rows_affected == 0 {
            return Err(DatabaseError::NotFound(format!("Workout {}", id)));
        }

        tx.commit()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    // ========== Track storage ==========

    /// Replace a workout's track wholesale (delete + bulk insert).
    pub fn replace_track(&mut self, workout_id: &Uuid, track: &Track) -> Result<(), DatabaseError> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        tx.execute(
            "DELETE FROM track_points WHERE workout_id = ?1",
            params![workout_id.to_string()],
        )
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO track_points (workout_id, elapsed_s, latitude, longitude,
                     cumulative_distance_m, elevation_m, heart_rate_bpm, cadence_rpm, power_watts)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                )
                .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

            for (i, point) in track.points.iter().enumerate() {
                stmt.execute(params![
                    workout_id.to_string(),
                    track.elapsed_s(i),
                    point.latitude,
                    point.longitude,
                    point.cumulative_distance_m,
                    point.elevation_m,
                    point.heart_rate_bpm,
                    point.cadence_rpm,
                    point.power_watts,
                ])
                .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            }
        }

        tx.commit()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Load a workout's track, rebuilding absolute timestamps from the
    /// workout start. Returns `None` when the workout does not exist.
    pub fn get_track(&self, workout_id: &Uuid) -> Result<Option<Track>, DatabaseError> {
        let workout = match self.get_workout(workout_id)? {
            Some(w) => w,
            None => return Ok(None),
        };

        let mut stmt = self
            .conn
            .prepare(
                "SELECT elapsed_s, latitude, longitude, cumulative_distance_m, elevation_m,
                 heart_rate_bpm, cadence_rpm, power_watts FROM track_points
                 WHERE workout_id = ?1 ORDER BY elapsed_s ASC, id ASC",
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map(params![workout_id.to_string()], |row| {
                Ok((
                    row.get::<_, f64>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, Option<f64>>(4)?,
                    row.get::<_, Option<u8>>(5)?,
                    row.get::<_, Option<u8>>(6)?,
                    row.get::<_, Option<u16>>(7)?,
                ))
            })
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut points = Vec::new();
        for row in rows {
            let (elapsed_s, latitude, longitude, cumulative_distance_m, elevation_m, hr, cad, pw) =
                row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            points.push(TrackPoint {
                timestamp: workout.started_at
                    + Duration::milliseconds((elapsed_s * 1000.0).round() as i64),
                latitude,
                longitude,
                cumulative_distance_m,
                elevation_m,
                heart_rate_bpm: hr,
                cadence_rpm: cad,
                power_watts: pw,
            });
        }

        let track = Track::from_points(points)
            .map_err(|e| DatabaseError::CorruptTrack(format!("Workout {workout_id}: {e}")))?;

        Ok(Some(track))
    }

    // ========== Split storage ==========

    /// Replace a workout's splits wholesale (delete + insert).
    pub fn replace_splits(
        &mut self,
        workout_id: &Uuid,
        splits: &[Split],
    ) -> Result<(), DatabaseError> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        tx.execute(
            "DELETE FROM splits WHERE workout_id = ?1",
            params![workout_id.to_string()],
        )
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO splits (workout_id, split_index, distance_m, duration_s, pace_s)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )
                .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

            for split in splits {
                stmt.execute(params![
                    workout_id.to_string(),
                    split.index,
                    split.distance_m,
                    split.duration_s,
                    split.pace_s,
                ])
                .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            }
        }

        tx.commit()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Get a workout's splits in order.
    pub fn get_splits(&self, workout_id: &Uuid) -> Result<Vec<Split>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT split_index, distance_m, duration_s, pace_s FROM splits
                 WHERE workout_id = ?1 ORDER BY split_index ASC",
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map(params![workout_id.to_string()], |row| {
                Ok(Split {
                    index: row.get(0)?,
                    distance_m: row.get(1)?,
                    duration_s: row.get(2)?,
                    pace_s: row.get(3)?,
                })
            })
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut splits = Vec::new();
        for row in rows {
            splits.push(row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?);
        }

        Ok(splits)
    }

    // ========== Best-effort record storage ==========

    /// Get the leaderboard record for a standard distance.
    pub fn get_record(
        &self,
        distance_name: &str,
    ) -> Result<Option<BestEffortRecord>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT distance_name, distance_m, time_s, workout_id, workout_date, updated_at
                 FROM best_effort_records WHERE distance_name = ?1",
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let result = stmt.query_row(params![distance_name], record_row);

        match result {
            Ok(row) => Ok(Some(row.into_record()?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DatabaseError::QueryFailed(e.to_string())),
        }
    }

    /// All leaderboard records, shortest distance first. A single query, so
    /// readers always observe a point-in-time snapshot.
    pub fn list_records(&self) -> Result<Vec<BestEffortRecord>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT distance_name, distance_m, time_s, workout_id, workout_date, updated_at
                 FROM best_effort_records ORDER BY distance_m ASC",
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map([], record_row)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut records = Vec::new();
        for row in rows {
            let row = row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            records.push(row.into_record()?);
        }

        Ok(records)
    }

    /// Distance names whose current record belongs to a workout.
    pub fn record_distances_for_workout(
        &self,
        workout_id: &Uuid,
    ) -> Result<Vec<String>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT distance_name FROM best_effort_records WHERE workout_id = ?1
                 ORDER BY distance_m ASC",
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map(params![workout_id.to_string()], |row| {
                row.get::<_, String>(0)
            })
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut names = Vec::new();
        for row in rows {
            names.push(row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?);
        }

        Ok(names)
    }

    /// Replace one distance's record wholesale.
    pub fn replace_record(&self, record: &BestEffortRecord) -> Result<(), DatabaseError> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO best_effort_records
                 (distance_name, distance_m, time_s, workout_id, workout_date, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.distance_name,
                    record.distance_m,
                    record.time_s,
                    record.workout_id.to_string(),
                    record.workout_date.to_rfc3339(),
                    record.updated_at.to_rfc3339(),
                ],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    /// Remove one distance's record (no error when absent).
    pub fn delete_record(&self, distance_name: &str) -> Result<(), DatabaseError> {
        self.conn
            .execute(
                "DELETE FROM best_effort_records WHERE distance_name = ?1",
                params![distance_name],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        Ok(())
    }
}

/// Intermediate struct for reading workout rows from database.
struct WorkoutRow {
    id: String,
    name: Option<String>,
    started_at: String,
    total_distance_m: f64,
    total_duration_s: f64,
    avg_pace_s: Option<f64>,
    elevation_gain_m: f64,
    elevation_loss_m: f64,
    created_at: String,
}

fn workout_row(row: &rusqlite::Row) -> rusqlite::Result<WorkoutRow> {
    Ok(WorkoutRow {
        id: row.get(0)?,
        name: row.get(1)?,
        started_at: row.get(2)?,
        total_distance_m: row.get(3)?,
        total_duration_s: row.get(4)?,
        avg_pace_s: row.get(5)?,
        elevation_gain_m: row.get(6)?,
        elevation_loss_m: row.get(7)?,
        created_at: row.get(8)?,
    })
}

impl WorkoutRow {
    fn into_workout(self) -> Result<Workout, DatabaseError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| DatabaseError::DeserializationError(format!("Invalid UUID: {}", e)))?;

        let started_at = parse_utc(&self.started_at, "start date")?;
        let created_at = parse_utc(&self.created_at, "created date")?;

        Ok(Workout {
            id,
            name: self.name,
            started_at,
            total_distance_m: self.total_distance_m,
            total_duration_s: self.total_duration_s,
            avg_pace_s: self.avg_pace_s,
            elevation_gain_m: self.elevation_gain_m,
            elevation_loss_m: self.elevation_loss_m,
            created_at,
        })
    }
}

/// Intermediate struct for reading best-effort record rows.
struct RecordRow {
    distance_name: String,
    distance_m: f64,
    time_s: f64,
    workout_id: String,
    workout_date: String,
    updated_at: String,
}

fn record_row(row: &rusqlite::Row) -> rusqlite::Result<RecordRow> {
    Ok(RecordRow {
        distance_name: row.get(0)?,
        distance_m: row.get(1)?,
        time_s: row.get(2)?,
        workout_id: row.get(3)?,
        workout_date: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

impl RecordRow {
    fn into_record(self) -> Result<BestEffortRecord, DatabaseError> {
        let workout_id = Uuid::parse_str(&self.workout_id).map_err(|e| {
            DatabaseError::DeserializationError(format!("Invalid workout UUID: {}", e))
        })?;

        Ok(BestEffortRecord {
            distance_name: self.distance_name,
            distance_m: self.distance_m,
            time_s: self.time_s,
            workout_id,
            workout_date: parse_utc(&self.workout_date, "workout date")?,
            updated_at: parse_utc(&self.updated_at, "updated date")?,
        })
    }
}

fn parse_utc(value: &str, what: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::DeserializationError(format!("Invalid {}: {}", what, e)))
}

/// Database errors.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Corrupt track: {0}")]
    CorruptTrack(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}
