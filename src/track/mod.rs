//! Track module: canonical sample model and standard distances.

pub mod distances;
pub mod types;

pub use distances::{standard_distance, StandardDistance, STANDARD_DISTANCES};
pub use types::{DistanceCursor, Track, TrackError, TrackPoint};
