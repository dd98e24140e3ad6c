//! Standard race distances.
//!
//! Static, read-only mapping from distance name to target meters. Best
//! efforts and leaderboard records are keyed by these names.

/// A standard race distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandardDistance {
    /// Display name, also the leaderboard key
    pub name: &'static str,
    /// Target distance in meters
    pub meters: f64,
}

/// All standard distances, shortest first.
pub const STANDARD_DISTANCES: &[StandardDistance] = &[
    StandardDistance { name: "400m", meters: 400.0 },
    StandardDistance { name: "800m", meters: 800.0 },
    StandardDistance { name: "1K", meters: 1000.0 },
    StandardDistance { name: "1 Mile", meters: 1609.344 },
    StandardDistance { name: "2 Mile", meters: 3218.688 },
    StandardDistance { name: "5K", meters: 5000.0 },
    StandardDistance { name: "10K", meters: 10000.0 },
    StandardDistance { name: "15K", meters: 15000.0 },
    StandardDistance { name: "10 Mile", meters: 16093.44 },
    StandardDistance { name: "20K", meters: 20000.0 },
    StandardDistance { name: "Half Marathon", meters: 21097.5 },
    StandardDistance { name: "30K", meters: 30000.0 },
    StandardDistance { name: "Marathon", meters: 42195.0 },
];

/// Look up a standard distance by name.
pub fn standard_distance(name: &str) -> Option<&'static StandardDistance> {
    STANDARD_DISTANCES.iter().find(|d| d.name == name)
}
