//! Best-run policy and canonical leaderboard order.
//!
//! One ordering drives both decisions: level (higher first), then progress
//! (higher first), then elapsed time (lower first), then score (higher first).
//! Merging keeps the stored run unless the candidate is strictly ahead of it;
//! ranking sorts the whole set by the same key and falls back to insertion
//! order for full ties.
use std::cmp::Ordering;

use crate::record::{PlayerId, RankingEntry, RecordSet, RunResult};

/// Exact value comparison that stays a total order.
///
/// `-0.0` and `0.0` compare equal; NaN sorts above every number instead of
/// breaking the sort.
fn cmp_real(a: f64, b: f64) -> Ordering {
    (a + 0.0).total_cmp(&(b + 0.0))
}

/// Canonical ordering of two runs. `Less` means `a` ranks ahead of `b`.
#[must_use]
pub fn compare_runs(a: &RunResult, b: &RunResult) -> Ordering {
    b.level
        .cmp(&a.level)
        .then_with(|| cmp_real(b.progress_pct, a.progress_pct))
        .then_with(|| cmp_real(a.elapsed_seconds, b.elapsed_seconds))
        .then_with(|| cmp_real(b.score, a.score))
}

/// Whether `candidate` is strictly better than `existing`.
#[must_use]
pub fn dominates(candidate: &RunResult, existing: &RunResult) -> bool {
    compare_runs(candidate, existing) == Ordering::Less
}

/// Pick the run to keep for a player.
///
/// Without a stored run the candidate wins outright; on a full tie the
/// stored run stays.
#[must_use]
pub fn merge(existing: Option<RunResult>, candidate: RunResult) -> RunResult {
    match existing {
        Some(existing) if !dominates(&candidate, &existing) => existing,
        _ => candidate,
    }
}

/// Order every record in the set and attach 1-based ranks.
#[must_use]
pub fn rank(records: &RecordSet) -> Vec<RankingEntry> {
    let mut ordered: Vec<&RunResult> = records.iter().collect();
    // `sort_by` is stable, so full ties keep insertion order.
    ordered.sort_by(|a, b| compare_runs(a, b));
    ordered
        .into_iter()
        .enumerate()
        .map(|(idx, run)| RankingEntry {
            rank: idx + 1,
            run: run.clone(),
        })
        .collect()
}

/// Rank of a player in an ordered ranking, if present.
#[must_use]
pub fn rank_of(ranking: &[RankingEntry], player_id: &PlayerId) -> Option<usize> {
    ranking
        .iter()
        .find(|entry| &entry.run.player_id == player_id)
        .map(|entry| entry.rank)
}

/// First `k` entries of a ranking.
#[must_use]
pub fn top(ranking: &[RankingEntry], k: usize) -> &[RankingEntry] {
    &ranking[..k.min(ranking.len())]
}

/// Drop excluded players from a ranking for display, keeping the remaining
/// entries' original ranks.
#[must_use]
pub fn without_players(ranking: &[RankingEntry], excluded: &[PlayerId]) -> Vec<RankingEntry> {
    ranking
        .iter()
        .filter(|entry| !excluded.contains(&entry.run.player_id))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(id: &str, level: u32, progress: f64, time: f64, score: f64) -> RunResult {
        RunResult::new(PlayerId::new(id).unwrap(), level, progress, time, score)
    }

    fn ids(ranking: &[RankingEntry]) -> Vec<&str> {
        ranking.iter().map(|e| e.run.player_id.as_str()).collect()
    }

    #[test]
    fn merge_without_existing_keeps_candidate() {
        let candidate = run("alice", 1, 0.0, 0.0, -5.0);
        assert_eq!(merge(None, candidate.clone()), candidate);
    }

    #[test]
    fn faster_time_beats_higher_score() {
        let existing = run("alice", 1, 80.0, 120.0, 500.0);
        let candidate = run("alice", 1, 80.0, 110.0, 400.0);
        assert_eq!(merge(Some(existing), candidate.clone()), candidate);
    }

    #[test]
    fn each_criterion_breaks_ties_in_priority_order() {
        let base = run("p", 2, 50.0, 100.0, 10.0);
        assert!(dominates(&run("p", 3, 0.0, 999.0, -1.0), &base));
        assert!(dominates(&run("p", 2, 50.1, 999.0, -1.0), &base));
        assert!(dominates(&run("p", 2, 50.0, 99.9, -1.0), &base));
        assert!(dominates(&run("p", 2, 50.0, 100.0, 10.5), &base));

        assert!(!dominates(&run("p", 1, 100.0, 1.0, 1e9), &base));
        assert!(!dominates(&run("p", 2, 49.9, 1.0, 1e9), &base));
        assert!(!dominates(&run("p", 2, 50.0, 100.1, 1e9), &base));
        assert!(!dominates(&run("p", 2, 50.0, 100.0, 9.0), &base));
    }

    #[test]
    fn full_tie_retains_existing() {
        let existing = run("alice", 1, 80.0, 120.0, 500.0);
        let candidate = run("alice", 1, 80.0, 120.0, 500.0);
        assert!(!dominates(&candidate, &existing));
        let kept = merge(Some(existing.clone()), candidate);
        assert_eq!(kept, existing);
    }

    #[test]
    fn negative_zero_ties_with_zero() {
        let existing = run("alice", 1, 0.0, 0.0, 0.0);
        let candidate = run("alice", 1, -0.0, -0.0, -0.0);
        assert!(!dominates(&candidate, &existing));
        assert!(!dominates(&existing, &candidate));
    }

    #[test]
    fn level_dominates_in_ranking() {
        let set: RecordSet = [
            run("alice", 1, 80.0, 120.0, 500.0),
            run("bob", 2, 50.0, 200.0, 100.0),
        ]
        .into_iter()
        .collect();
        let ranking = rank(&set);
        assert_eq!(ids(&ranking), vec!["bob", "alice"]);
        assert_eq!(ranking[0].rank, 1);
        assert_eq!(ranking[1].rank, 2);
    }

    #[test]
    fn empty_and_single_sets() {
        assert!(rank(&RecordSet::new()).is_empty());
        let single: RecordSet = std::iter::once(run("solo", 1, 1.0, 1.0, 1.0)).collect();
        let ranking = rank(&single);
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].rank, 1);
    }

    #[test]
    fn full_ties_keep_insertion_order() {
        let set: RecordSet = [
            run("carol", 1, 10.0, 10.0, 10.0),
            run("alice", 1, 10.0, 10.0, 10.0),
            run("bob", 1, 10.0, 10.0, 10.0),
        ]
        .into_iter()
        .collect();
        assert_eq!(ids(&rank(&set)), vec!["carol", "alice", "bob"]);
    }

    #[test]
    fn out_of_range_progress_sorts_on_raw_value() {
        let set: RecordSet = [
            run("clamped", 1, 100.0, 10.0, 0.0),
            run("overflow", 1, 104.2, 50.0, 0.0),
            run("under", 1, -3.0, 1.0, 0.0),
        ]
        .into_iter()
        .collect();
        assert_eq!(ids(&rank(&set)), vec!["overflow", "clamped", "under"]);
    }

    #[test]
    fn nan_values_do_not_break_sorting() {
        let set: RecordSet = [
            run("a", 1, f64::NAN, 10.0, 0.0),
            run("b", 1, 50.0, f64::NAN, 0.0),
            run("c", 1, 50.0, 10.0, f64::NAN),
        ]
        .into_iter()
        .collect();
        let ranking = rank(&set);
        assert_eq!(ranking.len(), 3);
        assert_eq!(ids(&ranking), ids(&rank(&set)));
    }

    #[test]
    fn helpers_truncate_filter_and_locate() {
        let set: RecordSet = [
            run("alice", 3, 10.0, 10.0, 0.0),
            run("test", 2, 10.0, 10.0, 0.0),
            run("bob", 1, 10.0, 10.0, 0.0),
        ]
        .into_iter()
        .collect();
        let ranking = rank(&set);
        assert_eq!(top(&ranking, 2).len(), 2);
        assert_eq!(top(&ranking, 10).len(), 3);
        assert_eq!(rank_of(&ranking, &PlayerId::new("bob").unwrap()), Some(3));
        assert_eq!(rank_of(&ranking, &PlayerId::new("zed").unwrap()), None);

        let shown = without_players(&ranking, &[PlayerId::new("test").unwrap()]);
        assert_eq!(ids(&shown), vec!["alice", "bob"]);
        assert_eq!(shown[1].rank, 3);
    }
}
