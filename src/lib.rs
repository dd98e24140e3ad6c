//! RunMetrics - Track-Derived Running Metrics Engine
//!
//! Computes and keeps consistent three correlated views of a workout
//! collection: fixed-distance splits, best efforts (the fastest contiguous
//! segment covering a standard race distance), and the global per-distance
//! leaderboard of best efforts, which stays correct as workouts are
//! imported, cropped, or deleted.

pub mod efforts;
pub mod leaderboard;
pub mod splits;
pub mod storage;
pub mod track;
pub mod workouts;

// Re-export commonly used types
pub use efforts::{find_best_effort, BestEffort, BestEffortCandidate};
pub use leaderboard::{BestEffortRecord, LeaderboardMaintainer};
pub use splits::{compute_splits, Split, SplitUnit};
pub use storage::Database;
pub use track::{Track, TrackPoint, STANDARD_DISTANCES};
pub use workouts::{crop_track, Workout, WorkoutService};
