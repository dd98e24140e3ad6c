//! Splits module: fixed-distance split calculation.

pub mod calculator;

pub use calculator::{compute_splits, Split, SplitUnit, MIN_PARTIAL_SPLIT_M};
