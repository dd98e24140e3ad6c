//! Leaderboard module: global best-effort records per standard distance.

pub mod maintainer;
pub mod records;

pub use maintainer::{LeaderboardError, LeaderboardMaintainer, RebuildSummary};
pub use records::BestEffortRecord;
