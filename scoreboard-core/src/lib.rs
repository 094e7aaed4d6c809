//! Scoreboard Engine
//!
//! Best-run bookkeeping for the human-play harness. A finished session
//! arrives as a [`RunResult`]; the engine loads the persisted record set,
//! keeps the better of the stored and the new run for that player, writes the
//! set back and returns the canonical standings. Rendering and the game loop
//! itself live elsewhere.

pub mod config;
pub mod numbers;
pub mod progress;
pub mod ranking;
pub mod record;
pub mod store;

// Re-export commonly used types
pub use config::{ConfigError, ScoreboardConfig};
pub use progress::{FALLBACK_END_DISTANCE, LevelDistances, progress_pct};
pub use ranking::{compare_runs, dominates, merge, rank, rank_of, top, without_players};
pub use record::{
    MAX_PLAYER_ID_LEN, MergeOutcome, PlayerId, PlayerIdError, RankingEntry, RecordSet, RunResult,
    SessionOutcome,
};
pub use store::{CsvFileStore, LoadIssue, LoadOutcome, RecordStorage, RowError, StoreError};

/// Result of recording one finished session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub outcome: MergeOutcome,
    /// Full standings after the merge, best first.
    pub standings: Vec<RankingEntry>,
    /// Rank of the session's player in `standings`.
    pub player_rank: Option<usize>,
}

/// Drives load, merge, save and rank against a record store.
///
/// The record set is loaded fresh for every call and never cached, so the
/// engine holds no state besides the storage handle.
pub struct Scoreboard<S>
where
    S: RecordStorage,
{
    storage: S,
}

impl<S> Scoreboard<S>
where
    S: RecordStorage,
{
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Merge a finished run into the persisted set and return the new standings.
    ///
    /// The set is saved even when the stored run is kept, so malformed rows
    /// dropped during the load do not survive the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written.
    pub fn record_run(&self, candidate: RunResult) -> Result<SessionReport, S::Error> {
        let player_id = candidate.player_id.clone();
        let mut records = self.storage.load()?;
        let outcome = records.consolidate(candidate);
        self.storage.save(&records)?;
        let standings = rank(&records);
        let player_rank = rank_of(&standings, &player_id);
        log::info!(
            "recorded run for {player_id}: {}, rank {}",
            if outcome.is_new_best() {
                "new best"
            } else {
                "previous best kept"
            },
            player_rank.map_or_else(|| "-".to_string(), |r| r.to_string())
        );
        Ok(SessionReport {
            outcome,
            standings,
            player_rank,
        })
    }

    /// Current standings without modifying the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn standings(&self) -> Result<Vec<RankingEntry>, S::Error> {
        self.storage.load().map(|records| rank(&records))
    }
}
