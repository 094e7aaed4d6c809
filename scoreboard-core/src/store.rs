//! Flat-file persistence for the best-run record set.
//!
//! File layout, UTF-8, comma delimited, header first:
//!
//! ```text
//! player_id,level,progress_pct,elapsed_seconds,score
//! alice,2,87.5,143.22,1540.0
//! ```
//!
//! The whole set is rewritten on every save. Rows that do not parse are
//! dropped on load and reported as [`LoadIssue`]s instead of failing the load.
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::record::{PlayerId, PlayerIdError, RecordSet, RunResult};

/// Column names, in on-disk order.
pub const HEADER: [&str; 5] = [
    "player_id",
    "level",
    "progress_pct",
    "elapsed_seconds",
    "score",
];

/// File name used when no path is configured.
pub const DEFAULT_FILE_NAME: &str = "scoreboard.csv";

const DELIMITER: char = ',';

/// Filesystem failures while reading or writing the record file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read scoreboard file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write scoreboard file {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A record would not load back from disk; nothing was written.
    #[error("record for {player_id} cannot be stored")]
    Unstorable {
        player_id: PlayerId,
        #[source]
        reason: RowError,
    },
}

/// Why a single row was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("expected {expected} fields, found {0}", expected = HEADER.len())]
    ExtraFields(usize),
    #[error("row is not valid UTF-8")]
    InvalidEncoding,
    #[error("invalid player id: {0}")]
    PlayerId(#[from] PlayerIdError),
    #[error("field `{field}` has invalid value {value:?}")]
    InvalidField { field: &'static str, value: String },
}

/// Recoverable conditions met while loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadIssue {
    /// Row dropped because a field is missing or unparseable.
    MalformedRow { line: usize, reason: RowError },
    /// A player appeared on several rows; the later row won.
    DuplicatePlayer {
        player_id: PlayerId,
        line: usize,
        previous_line: usize,
    },
}

impl fmt::Display for LoadIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedRow { line, reason } => {
                write!(f, "line {line}: row skipped ({reason})")
            }
            Self::DuplicatePlayer {
                player_id,
                line,
                previous_line,
            } => write!(
                f,
                "line {line}: duplicate player {player_id} replaces line {previous_line}"
            ),
        }
    }
}

/// Records read from disk plus everything that was skipped or collapsed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadOutcome {
    pub records: RecordSet,
    pub issues: Vec<LoadIssue>,
}

/// Persistence seam for the record set.
/// Implementations rewrite the whole set on every save.
pub trait RecordStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the persisted set; an absent store is an empty set.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn load(&self) -> Result<RecordSet, Self::Error>;

    /// Replace the persisted set with `records`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn save(&self, records: &RecordSet) -> Result<(), Self::Error>;
}

/// Record store backed by a comma-delimited file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvFileStore {
    path: PathBuf,
}

impl CsvFileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the file and report every skipped row and duplicate collision.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Read`] if the file exists but cannot be read.
    pub fn load_detailed(&self) -> Result<LoadOutcome, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                log::debug!("no scoreboard at {}, starting empty", self.path.display());
                return Ok(LoadOutcome::default());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        let outcome = parse_record_bytes(&bytes);
        for issue in &outcome.issues {
            log::warn!("{}: {issue}", self.path.display());
        }
        Ok(outcome)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl RecordStorage for CsvFileStore {
    type Error = StoreError;

    fn load(&self) -> Result<RecordSet, Self::Error> {
        self.load_detailed().map(|outcome| outcome.records)
    }

    fn save(&self, records: &RecordSet) -> Result<(), Self::Error> {
        if let Some((run, reason)) = records
            .iter()
            .find_map(|run| check_storable(run).err().map(|reason| (run, reason)))
        {
            return Err(StoreError::Unstorable {
                player_id: run.player_id.clone(),
                reason,
            });
        }
        let body = render_records(records);
        let tmp = self.temp_path();
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };
        fs::write(&tmp, body).map_err(write_err)?;
        if let Err(source) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(write_err(source));
        }
        log::debug!(
            "saved {} records to {}",
            records.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// Parse file contents into a record set, collecting issues instead of failing.
///
/// A header row is skipped when it is the first non-blank line. When a player
/// id repeats, the last row for that id wins.
#[must_use]
pub fn parse_records(text: &str) -> LoadOutcome {
    parse_record_bytes(text.as_bytes())
}

/// Like [`parse_records`], but decodes each line on its own so a line that is
/// not UTF-8 is reported as malformed without losing the rest of the file.
#[must_use]
pub fn parse_record_bytes(bytes: &[u8]) -> LoadOutcome {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut outcome = LoadOutcome::default();
    let mut seen_at: Vec<(PlayerId, usize)> = Vec::new();
    let mut first_row = true;

    for (idx, raw) in bytes.split(|b| *b == b'\n').enumerate() {
        let line = idx + 1;
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let Ok(raw) = std::str::from_utf8(raw) else {
            first_row = false;
            outcome.issues.push(LoadIssue::MalformedRow {
                line,
                reason: RowError::InvalidEncoding,
            });
            continue;
        };
        if raw.trim().is_empty() {
            continue;
        }
        if std::mem::take(&mut first_row) && is_header(raw) {
            continue;
        }
        let run = match parse_row(raw) {
            Ok(run) => run,
            Err(reason) => {
                outcome.issues.push(LoadIssue::MalformedRow { line, reason });
                continue;
            }
        };
        if let Some(slot) = seen_at.iter_mut().find(|(id, _)| *id == run.player_id) {
            outcome.issues.push(LoadIssue::DuplicatePlayer {
                player_id: run.player_id.clone(),
                line,
                previous_line: slot.1,
            });
            slot.1 = line;
        } else {
            seen_at.push((run.player_id.clone(), line));
        }
        outcome.records.insert(run);
    }
    outcome
}

fn is_header(raw: &str) -> bool {
    raw.split(DELIMITER)
        .map(str::trim)
        .eq(HEADER.iter().copied())
}

/// Parse one data row in `HEADER` order.
///
/// # Errors
///
/// Returns [`RowError`] when a field is missing, extra fields are present,
/// or a value does not parse as its type.
pub fn parse_row(raw: &str) -> Result<RunResult, RowError> {
    let fields: Vec<&str> = raw.split(DELIMITER).map(str::trim).collect();
    if fields.len() > HEADER.len() {
        return Err(RowError::ExtraFields(fields.len()));
    }
    let field = |idx: usize| -> Result<&str, RowError> {
        fields
            .get(idx)
            .copied()
            .filter(|value| !value.is_empty())
            .ok_or(RowError::MissingField(HEADER[idx]))
    };

    let player_id = PlayerId::new(field(0)?)?;
    let level = field(1)?
        .parse::<u32>()
        .ok()
        .filter(|level| *level >= 1)
        .ok_or_else(|| invalid(1, &fields))?;
    let progress_pct = parse_real(field(2)?).ok_or_else(|| invalid(2, &fields))?;
    let elapsed_seconds = parse_real(field(3)?)
        .filter(|secs| *secs >= 0.0)
        .ok_or_else(|| invalid(3, &fields))?;
    let score = parse_real(field(4)?).ok_or_else(|| invalid(4, &fields))?;

    Ok(RunResult {
        player_id,
        level,
        progress_pct,
        elapsed_seconds,
        score,
    })
}

fn invalid(idx: usize, fields: &[&str]) -> RowError {
    RowError::InvalidField {
        field: HEADER[idx],
        value: fields.get(idx).copied().unwrap_or_default().to_string(),
    }
}

/// Check that a record survives a save/load cycle unchanged in validity.
fn check_storable(run: &RunResult) -> Result<(), RowError> {
    let bad = |idx: usize, value: String| RowError::InvalidField {
        field: HEADER[idx],
        value,
    };
    if run.level < 1 {
        return Err(bad(1, run.level.to_string()));
    }
    let reals = [
        (2, run.progress_pct),
        (3, run.elapsed_seconds),
        (4, run.score),
    ];
    for (idx, value) in reals {
        if !value.is_finite() || (idx == 3 && value < 0.0) {
            return Err(bad(idx, format_real(value)));
        }
    }
    Ok(())
}

fn parse_real(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Render the full set, header first, records in insertion order.
#[must_use]
pub fn render_records(records: &RecordSet) -> String {
    let mut out = HEADER.join(",");
    out.push('\n');
    for run in records {
        out.push_str(&render_row(run));
        out.push('\n');
    }
    out
}

fn render_row(run: &RunResult) -> String {
    format!(
        "{},{},{},{},{}",
        run.player_id,
        run.level,
        format_real(run.progress_pct),
        format_real(run.elapsed_seconds),
        format_real(run.score),
    )
}

/// Shortest round-trippable decimal with at least one fractional digit.
#[must_use]
pub fn format_real(value: f64) -> String {
    let text = value.to_string();
    if !value.is_finite() || text.contains('.') {
        text
    } else {
        format!("{text}.0")
    }
}
