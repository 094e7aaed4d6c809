//! Level progress: how far into a level a run got, as a percentage.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::numbers::clamp_percent;

/// End distance assumed for levels missing from the table.
pub const FALLBACK_END_DISTANCE: f64 = 3186.0;

/// Horizontal end distance of each level, keyed by level number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDistances {
    #[serde(default = "LevelDistances::default_table")]
    pub table: BTreeMap<u32, f64>,
    #[serde(default = "LevelDistances::default_fallback")]
    pub fallback: f64,
}

impl LevelDistances {
    fn default_table() -> BTreeMap<u32, f64> {
        BTreeMap::from([(1, 3155.0), (2, 3155.0), (3, 4000.0)])
    }

    const fn default_fallback() -> f64 {
        FALLBACK_END_DISTANCE
    }

    /// End distance for `level`, falling back when the level is unknown.
    #[must_use]
    pub fn end_distance(&self, level: u32) -> f64 {
        self.table.get(&level).copied().unwrap_or(self.fallback)
    }
}

impl Default for LevelDistances {
    fn default() -> Self {
        Self {
            table: Self::default_table(),
            fallback: Self::default_fallback(),
        }
    }
}

/// Percentage of `level_end` covered by `distance`, capped at 100.
///
/// Distances past the known end of the level still report 100; a
/// non-positive or non-finite `level_end` reports 0.
#[must_use]
pub fn progress_pct(distance: f64, level_end: f64) -> f64 {
    if !level_end.is_finite() || level_end <= 0.0 {
        return 0.0;
    }
    let ratio = (distance.max(0.0) / level_end).min(1.0);
    clamp_percent(ratio * 100.0)
}
