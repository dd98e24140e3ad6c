//! Database schema definitions for the metrics engine.

/// SQL for the schema version table, created before any migration runs.
pub const SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);
"#;

/// Current schema version.
pub const CURRENT_VERSION: i32 = 1;

/// SQL schema for all engine tables.
///
/// Derived rows carry no incremental bookkeeping: splits and best-effort
/// records are always replaced wholesale, so the tables stay trivially
/// auditable against the live tracks.
pub const SCHEMA: &str = r#"
-- Workouts table (summary aggregates; samples live in track_points)
CREATE TABLE IF NOT EXISTS workouts (
    id TEXT PRIMARY KEY,
    name TEXT,
    started_at TEXT NOT NULL,
    total_distance_m REAL NOT NULL,
    total_duration_s REAL NOT NULL,
    avg_pace_s REAL,
    elevation_gain_m REAL NOT NULL DEFAULT 0,
    elevation_loss_m REAL NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_workouts_started_at ON workouts(started_at);
CREATE INDEX IF NOT EXISTS idx_workouts_total_distance ON workouts(total_distance_m);

-- Track points table (elapsed seconds relative to workout start)
CREATE TABLE IF NOT EXISTS track_points (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    workout_id TEXT NOT NULL REFERENCES workouts(id),
    elapsed_s REAL NOT NULL,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    cumulative_distance_m REAL NOT NULL,
    elevation_m REAL,
    heart_rate_bpm INTEGER,
    cadence_rpm INTEGER,
    power_watts INTEGER
);

CREATE INDEX IF NOT EXISTS idx_track_points_workout_id ON track_points(workout_id);

-- Splits table (regenerated wholesale per workout)
CREATE TABLE IF NOT EXISTS splits (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    workout_id TEXT NOT NULL REFERENCES workouts(id),
    split_index INTEGER NOT NULL,
    distance_m REAL NOT NULL,
    duration_s REAL NOT NULL,
    pace_s REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_splits_workout_id ON splits(workout_id);

-- Best-effort leaderboard records (one row per standard distance)
CREATE TABLE IF NOT EXISTS best_effort_records (
    distance_name TEXT PRIMARY KEY,
    distance_m REAL NOT NULL,
    time_s REAL NOT NULL,
    workout_id TEXT NOT NULL,
    workout_date TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_best_effort_records_workout_id
    ON best_effort_records(workout_id);
"#;
