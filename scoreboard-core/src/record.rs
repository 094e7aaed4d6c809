//! Scoreboard data model: players, finished runs and the best-run record set.
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::numbers::round_to_places;
use crate::progress::{LevelDistances, progress_pct};

/// Longest player id the recording front-ends accept.
///
/// The store itself never enforces this bound; rows written by older
/// front-ends with longer ids still load.
pub const MAX_PLAYER_ID_LEN: usize = 15;

/// Decimal places kept for `progress_pct` when a run is built from raw session data.
pub const PROGRESS_DECIMALS: u32 = 1;
/// Decimal places kept for `elapsed_seconds` and `score`.
pub const TIME_SCORE_DECIMALS: u32 = 2;

/// Reasons a player id is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlayerIdError {
    #[error("player id must not be empty")]
    Empty,
    #[error("player id {0:?} contains a delimiter or line break")]
    ForbiddenChar(String),
    #[error("player id {id:?} is longer than {max} characters")]
    TooLong { id: String, max: usize },
}

/// Unique, case-sensitive key identifying a player.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlayerId(String);

impl PlayerId {
    /// Build a player id from raw input, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`PlayerIdError`] when the trimmed id is empty or contains the
    /// field delimiter or a line break.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, PlayerIdError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(PlayerIdError::Empty);
        }
        if trimmed.contains([',', '\n', '\r']) {
            return Err(PlayerIdError::ForbiddenChar(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Like [`PlayerId::new`], additionally enforcing the front-end length bound.
    ///
    /// # Errors
    ///
    /// Returns [`PlayerIdError::TooLong`] when the id exceeds [`MAX_PLAYER_ID_LEN`] characters.
    pub fn new_bounded(raw: impl AsRef<str>) -> Result<Self, PlayerIdError> {
        let id = Self::new(raw)?;
        if id.0.chars().count() > MAX_PLAYER_ID_LEN {
            return Err(PlayerIdError::TooLong {
                id: id.0,
                max: MAX_PLAYER_ID_LEN,
            });
        }
        Ok(id)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PlayerId {
    type Error = PlayerIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PlayerId> for String {
    fn from(value: PlayerId) -> Self {
        value.0
    }
}

impl std::str::FromStr for PlayerId {
    type Err = PlayerIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Outcome of one completed play session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub player_id: PlayerId,
    /// Highest level/stage reached, starting at 1.
    pub level: u32,
    /// Percent of the level's horizontal distance covered.
    pub progress_pct: f64,
    pub elapsed_seconds: f64,
    /// Cumulative in-run reward; may be negative.
    pub score: f64,
}

/// Raw figures reported by the game loop when a session ends.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    pub player_id: PlayerId,
    pub level: u32,
    /// Horizontal distance reached in the final level.
    pub distance: f64,
    pub elapsed_seconds: f64,
    pub score: f64,
}

impl RunResult {
    #[must_use]
    pub const fn new(
        player_id: PlayerId,
        level: u32,
        progress_pct: f64,
        elapsed_seconds: f64,
        score: f64,
    ) -> Self {
        Self {
            player_id,
            level,
            progress_pct,
            elapsed_seconds,
            score,
        }
    }

    /// Build a run from raw session figures the way the game loop reports it:
    /// progress against the level's end distance, clamped to 100 and rounded
    /// to one decimal, time and score rounded to two decimals.
    #[must_use]
    pub fn from_session(outcome: SessionOutcome, distances: &LevelDistances) -> Self {
        let level = outcome.level.max(1);
        let pct = progress_pct(outcome.distance, distances.end_distance(level));
        Self {
            player_id: outcome.player_id,
            level,
            progress_pct: round_to_places(pct, PROGRESS_DECIMALS),
            elapsed_seconds: round_to_places(
                outcome.elapsed_seconds.max(0.0),
                TIME_SCORE_DECIMALS,
            ),
            score: round_to_places(outcome.score, TIME_SCORE_DECIMALS),
        }
    }
}

/// A run attached to its current 1-based table rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub rank: usize,
    #[serde(flatten)]
    pub run: RunResult,
}

/// What happened to the record set when a candidate run was consolidated.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    /// First run recorded for this player.
    Inserted,
    /// The candidate beat the stored run, which is returned.
    Replaced { previous: RunResult },
    /// The stored run was at least as good; the candidate is returned.
    Retained { rejected: RunResult },
}

impl MergeOutcome {
    /// Whether the candidate is now the player's stored run.
    #[must_use]
    pub const fn is_new_best(&self) -> bool {
        matches!(self, Self::Inserted | Self::Replaced { .. })
    }
}

/// One best run per player, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    records: Vec<RunResult>,
}

impl RecordSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Find the stored run for a player.
    #[must_use]
    pub fn get(&self, player_id: &PlayerId) -> Option<&RunResult> {
        self.records.iter().find(|run| &run.player_id == player_id)
    }

    #[must_use]
    pub fn contains(&self, player_id: &PlayerId) -> bool {
        self.get(player_id).is_some()
    }

    /// Records in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, RunResult> {
        self.records.iter()
    }

    /// Store `run` as the player's record, unconditionally.
    ///
    /// The run moves to the end of the insertion order. Returns the run it
    /// displaced, if any.
    pub fn insert(&mut self, run: RunResult) -> Option<RunResult> {
        let previous = self.remove(&run.player_id);
        self.records.push(run);
        previous
    }

    /// Remove a player's record.
    pub fn remove(&mut self, player_id: &PlayerId) -> Option<RunResult> {
        let idx = self
            .records
            .iter()
            .position(|run| &run.player_id == player_id)?;
        Some(self.records.remove(idx))
    }

    /// Merge a freshly finished run into the set using the best-run policy.
    ///
    /// Only the candidate player's slot can change.
    pub fn consolidate(&mut self, candidate: RunResult) -> MergeOutcome {
        let beats_stored = self
            .get(&candidate.player_id)
            .map(|existing| crate::ranking::dominates(&candidate, existing));
        match beats_stored {
            None => {
                log::debug!("first run recorded for {}", candidate.player_id);
                self.records.push(candidate);
                MergeOutcome::Inserted
            }
            Some(true) => {
                log::debug!("new best run for {}", candidate.player_id);
                match self.insert(candidate) {
                    Some(previous) => MergeOutcome::Replaced { previous },
                    None => MergeOutcome::Inserted,
                }
            }
            Some(false) => {
                log::debug!("stored run for {} kept", candidate.player_id);
                MergeOutcome::Retained {
                    rejected: candidate,
                }
            }
        }
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a RunResult;
    type IntoIter = std::slice::Iter<'a, RunResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl FromIterator<RunResult> for RecordSet {
    /// Later runs for the same player overwrite earlier ones.
    fn from_iter<I: IntoIterator<Item = RunResult>>(iter: I) -> Self {
        let mut set = Self::new();
        for run in iter {
            set.insert(run);
        }
        set
    }
}
