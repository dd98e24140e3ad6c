//! Workouts module: workout model, crop operator, and the CRUD service.

pub mod crop;
pub mod service;
pub mod types;

pub use crop::{crop_track, CropError};
pub use service::{RelativeEffortHook, ServiceError, WorkoutService};
pub use types::{average_pace_s, Workout};
