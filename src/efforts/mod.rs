//! Efforts module: best-effort window search.

pub mod finder;

pub use finder::{
    find_best_effort, standard_candidates, BestEffort, BestEffortCandidate, DataQuality,
    SPARSE_GAP_S,
};
