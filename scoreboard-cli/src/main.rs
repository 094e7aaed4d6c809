mod reports;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{BufWriter, Stdout, Write, stdout};
use std::path::{Path, PathBuf};

use reports::Highlight;
use scoreboard_core::numbers::{clamp_percent, round_to_places};
use scoreboard_core::record::{PROGRESS_DECIMALS, TIME_SCORE_DECIMALS};
use scoreboard_core::{
    CsvFileStore, LevelDistances, PlayerId, RankingEntry, RunResult, Scoreboard, ScoreboardConfig,
    SessionOutcome, top, without_players,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Colored table for terminals
    Console,
    Json,
    Markdown,
    /// Ranked rows with a header, same number format as the scoreboard file
    Csv,
}

#[derive(Debug, Parser)]
#[command(name = "scoreboard", version)]
#[command(about = "Record finished runs and print the best-run standings")]
struct Args {
    /// Scoreboard file (overrides the config file)
    #[arg(long, global = true, env = "SCOREBOARD_FILE")]
    file: Option<PathBuf>,

    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Number of rows to show (overrides the config file)
    #[arg(long, global = true, value_parser = clap::value_parser!(u32).range(1..))]
    top: Option<u32>,

    /// Player ids to hide from the standings (comma-separated)
    #[arg(long, global = true)]
    exclude: Option<String>,

    /// Output report format
    #[arg(long, global = true, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Record a finished run and print the updated standings
    Record(RecordArgs),
    /// Print the current standings
    Show,
}

#[derive(Debug, clap::Args)]
struct RecordArgs {
    /// Player id (at most 15 characters)
    #[arg(long)]
    player: String,

    /// Highest level reached
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    level: u32,

    /// Percent of the level covered; clamped to [0, 100]
    #[arg(
        long,
        required_unless_present = "distance",
        conflicts_with = "distance",
        allow_negative_numbers = true
    )]
    progress: Option<f64>,

    /// Horizontal distance reached; converted using the level's end distance
    #[arg(long, allow_negative_numbers = true)]
    distance: Option<f64>,

    /// Wall-clock duration of the run in seconds
    #[arg(long, allow_negative_numbers = true)]
    elapsed: f64,

    /// Cumulative in-run score (may be negative)
    #[arg(long, allow_hyphen_values = true)]
    score: f64,
}

/// Effective settings after layering CLI flags over the config file.
#[derive(Debug, Clone, PartialEq)]
struct Settings {
    file: PathBuf,
    top_n: usize,
    excluded: Vec<PlayerId>,
    distances: LevelDistances,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let settings = resolve_settings(&args)?;
    log::debug!(
        "scoreboard {} (top {}, {} excluded)",
        settings.file.display(),
        settings.top_n,
        settings.excluded.len()
    );
    let board = Scoreboard::new(CsvFileStore::new(&settings.file));

    match &args.command {
        Command::Record(record) => {
            let candidate = build_run(record, &settings.distances)?;
            let player_id = candidate.player_id.clone();
            let report = board
                .record_run(candidate)
                .with_context(|| format!("failed to record run in {}", settings.file.display()))
                .inspect_err(|err| log::debug!("{err:?}"))?;
            let highlight = Highlight {
                player_id: &player_id,
                outcome: &report.outcome,
                rank: report.player_rank,
            };
            let shown = visible_standings(&report.standings, &settings);
            emit_report(args.output.as_deref(), args.report, &shown, Some(&highlight))
        }
        Command::Show => {
            let standings = board
                .standings()
                .with_context(|| {
                    format!("failed to load standings from {}", settings.file.display())
                })
                .inspect_err(|err| log::debug!("{err:?}"))?;
            let shown = visible_standings(&standings, &settings);
            emit_report(args.output.as_deref(), args.report, &shown, None)
        }
    }
}

/// Open the report destination only once there is something to write, so a
/// failed run leaves an earlier `--output` file intact.
fn emit_report(
    output: Option<&Path>,
    format: ReportFormat,
    standings: &[RankingEntry],
    highlight: Option<&Highlight<'_>>,
) -> Result<()> {
    let mut sink = ReportSink::open(output)?;
    write_report(&mut sink, format, standings, highlight)?;
    sink.finish()
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let env = env_logger::Env::default().default_filter_or(default_filter);
    let _ = env_logger::Builder::from_env(env).try_init();
}

fn resolve_settings(args: &Args) -> Result<Settings> {
    let cfg = match &args.config {
        Some(path) => ScoreboardConfig::from_path(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ScoreboardConfig::default(),
    };
    let mut excluded = cfg.excluded_players;
    if let Some(raw) = &args.exclude {
        for id in parse_exclude_list(raw)? {
            if !excluded.contains(&id) {
                excluded.push(id);
            }
        }
    }
    let top_n = match args.top {
        Some(n) => usize::try_from(n).context("--top out of range")?,
        None => cfg.top_n,
    };
    Ok(Settings {
        file: args.file.clone().unwrap_or(cfg.file),
        top_n,
        excluded,
        distances: cfg.level_distances,
    })
}

/// Build the run the way the game loop reports it: progress clamped and
/// rounded to one decimal, time and score rounded to two.
fn build_run(record: &RecordArgs, distances: &LevelDistances) -> Result<RunResult> {
    let player_id = PlayerId::new_bounded(&record.player)
        .with_context(|| format!("invalid player id {:?}", record.player))?;
    if !record.elapsed.is_finite() || record.elapsed < 0.0 {
        bail!("--elapsed must be a non-negative number of seconds");
    }
    if !record.score.is_finite() {
        bail!("--score must be a finite number");
    }

    if let Some(distance) = record.distance {
        if !distance.is_finite() {
            bail!("--distance must be a finite number");
        }
        let outcome = SessionOutcome {
            player_id,
            level: record.level,
            distance,
            elapsed_seconds: record.elapsed,
            score: record.score,
        };
        return Ok(RunResult::from_session(outcome, distances));
    }

    let Some(progress) = record.progress else {
        bail!("either --progress or --distance is required");
    };
    if !progress.is_finite() {
        bail!("--progress must be a finite number");
    }
    Ok(RunResult::new(
        player_id,
        record.level,
        round_to_places(clamp_percent(progress), PROGRESS_DECIMALS),
        round_to_places(record.elapsed, TIME_SCORE_DECIMALS),
        round_to_places(record.score, TIME_SCORE_DECIMALS),
    ))
}

fn visible_standings(standings: &[RankingEntry], settings: &Settings) -> Vec<RankingEntry> {
    let filtered = without_players(standings, &settings.excluded);
    top(&filtered, settings.top_n).to_vec()
}

fn write_report<W: Write>(
    out: &mut W,
    format: ReportFormat,
    standings: &[RankingEntry],
    highlight: Option<&Highlight<'_>>,
) -> Result<()> {
    match format {
        ReportFormat::Console => reports::generate_console_report(out, standings, highlight),
        ReportFormat::Json => reports::generate_json_report(out, standings, highlight),
        ReportFormat::Markdown => reports::generate_markdown_report(out, standings, highlight),
        ReportFormat::Csv => reports::generate_csv_report(out, standings),
    }
}

/// Comma-separated player ids; empty entries are ignored.
fn parse_exclude_list(raw: &str) -> Result<Vec<PlayerId>> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            PlayerId::new(token).with_context(|| format!("invalid --exclude entry {token:?}"))
        })
        .collect()
}

/// Buffered destination for a rendered report.
enum ReportSink {
    Stdout(BufWriter<Stdout>),
    File { path: PathBuf, out: BufWriter<File> },
}

impl ReportSink {
    fn open(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::Stdout(BufWriter::new(stdout())));
        };
        let file = File::create(path)
            .with_context(|| format!("failed to create report {}", path.display()))?;
        Ok(Self::File {
            path: path.to_path_buf(),
            out: BufWriter::new(file),
        })
    }

    fn finish(mut self) -> Result<()> {
        let flushed = self.flush();
        match &self {
            Self::Stdout(_) => flushed.context("failed to write report to stdout"),
            Self::File { path, .. } => {
                flushed.with_context(|| format!("failed to write report {}", path.display()))
            }
        }
    }
}

impl Write for ReportSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Self::Stdout(out) => out.write(buf),
            Self::File { out, .. } => out.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(out) => out.flush(),
            Self::File { out, .. } => out.flush(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scoreboard_core::{RecordSet, rank};

    fn base_args(command: Command) -> Args {
        Args {
            file: None,
            config: None,
            top: None,
            exclude: None,
            report: ReportFormat::Console,
            output: None,
            verbose: false,
            command,
        }
    }

    fn record_args() -> RecordArgs {
        RecordArgs {
            player: " alice ".to_string(),
            level: 1,
            progress: Some(87.46),
            distance: None,
            elapsed: 143.2249,
            score: -12.346,
        }
    }

    #[test]
    fn args_parse_record_command() {
        let args = Args::try_parse_from([
            "scoreboard",
            "record",
            "--player",
            "alice",
            "--level",
            "2",
            "--progress",
            "87.5",
            "--elapsed",
            "143.22",
            "--score",
            "-5",
            "--report",
            "csv",
        ])
        .unwrap();
        assert_eq!(args.report, ReportFormat::Csv);
        let Command::Record(record) = args.command else {
            panic!("expected record command");
        };
        assert_eq!(record.level, 2);
        assert!((record.score + 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn args_require_progress_or_distance() {
        let parsed = Args::try_parse_from([
            "scoreboard", "record", "--player", "a", "--level", "1", "--elapsed", "1", "--score",
            "1",
        ]);
        assert!(parsed.is_err());
        let parsed = Args::try_parse_from([
            "scoreboard",
            "record",
            "--player",
            "a",
            "--level",
            "1",
            "--progress",
            "1",
            "--distance",
            "1",
            "--elapsed",
            "1",
            "--score",
            "1",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn args_reject_level_zero() {
        let parsed = Args::try_parse_from([
            "scoreboard", "record", "--player", "a", "--level", "0", "--progress", "1",
            "--elapsed", "1", "--score", "1",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn build_run_rounds_progress_input() {
        let run = build_run(&record_args(), &LevelDistances::default()).unwrap();
        assert_eq!(run.player_id.as_str(), "alice");
        assert!((run.progress_pct - 87.5).abs() < f64::EPSILON);
        assert!((run.elapsed_seconds - 143.22).abs() < f64::EPSILON);
        assert!((run.score + 12.35).abs() < 1e-9);
    }

    #[test]
    fn build_run_converts_distance() {
        let record = RecordArgs {
            progress: None,
            distance: Some(6000.0),
            ..record_args()
        };
        let run = build_run(&record, &LevelDistances::default()).unwrap();
        assert!((run.progress_pct - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn build_run_rejects_bad_input() {
        let distances = LevelDistances::default();
        let negative_time = RecordArgs {
            elapsed: -1.0,
            ..record_args()
        };
        assert!(build_run(&negative_time, &distances).is_err());
        let long_name = RecordArgs {
            player: "a_very_long_player_name".to_string(),
            ..record_args()
        };
        assert!(build_run(&long_name, &distances).is_err());
    }

    #[test]
    fn settings_layer_flags_over_config() {
        let dir = tempfile::tempdir().unwrap();
        let cfg_path = dir.path().join("scoreboard.json");
        std::fs::write(
            &cfg_path,
            r#"{"file": "from-config.csv", "top_n": 3, "excluded_players": ["test"]}"#,
        )
        .unwrap();

        let mut args = base_args(Command::Show);
        args.config = Some(cfg_path);
        let settings = resolve_settings(&args).unwrap();
        assert_eq!(settings.file, PathBuf::from("from-config.csv"));
        assert_eq!(settings.top_n, 3);

        args.file = Some(PathBuf::from("override.csv"));
        args.top = Some(7);
        args.exclude = Some("bot, test".to_string());
        let settings = resolve_settings(&args).unwrap();
        assert_eq!(settings.file, PathBuf::from("override.csv"));
        assert_eq!(settings.top_n, 7);
        let excluded: Vec<&str> = settings.excluded.iter().map(PlayerId::as_str).collect();
        assert_eq!(excluded, vec!["test", "bot"]);
    }

    #[test]
    fn visible_standings_filters_then_truncates() {
        let records: RecordSet = ["a", "test", "b", "c"]
            .into_iter()
            .enumerate()
            .map(|(idx, id)| {
                RunResult::new(
                    PlayerId::new(id).unwrap(),
                    10 - u32::try_from(idx).unwrap(),
                    0.0,
                    0.0,
                    0.0,
                )
            })
            .collect();
        let standings = rank(&records);
        let settings = Settings {
            file: PathBuf::from("unused.csv"),
            top_n: 2,
            excluded: vec![PlayerId::new("test").unwrap()],
            distances: LevelDistances::default(),
        };
        let shown = visible_standings(&standings, &settings);
        let ids: Vec<&str> = shown.iter().map(|e| e.run.player_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn write_report_emits_csv() {
        let standings = rank(
            &std::iter::once(RunResult::new(PlayerId::new("solo").unwrap(), 1, 5.0, 6.0, 7.0))
                .collect(),
        );
        let mut buf = Vec::new();
        write_report(&mut buf, ReportFormat::Csv, &standings, None).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.ends_with("1,solo,1,5.0,6.0,7.0\n"));
    }

    #[test]
    fn report_sink_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        let mut sink = ReportSink::open(Some(&path)).unwrap();
        writeln!(sink, "hello").unwrap();
        sink.finish().unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "hello\n");
    }

    #[test]
    fn exclude_list_trims_and_skips_empty_entries() {
        let ids = parse_exclude_list(" alpha, ,beta,  gamma ").unwrap();
        let ids: Vec<&str> = ids.iter().map(PlayerId::as_str).collect();
        assert_eq!(ids, vec!["alpha", "beta", "gamma"]);
        assert!(parse_exclude_list("ok,bad\nid").is_err());
    }

    #[test]
    fn args_accept_negative_progress_and_distance() {
        for flag in ["--progress", "--distance"] {
            let args = Args::try_parse_from([
                "scoreboard", "record", "--player", "a", "--level", "1", flag, "-5",
                "--elapsed", "1", "--score", "1",
            ])
            .unwrap();
            let Command::Record(record) = args.command else {
                panic!("expected record command");
            };
            let run = build_run(&record, &LevelDistances::default()).unwrap();
            assert!((run.progress_pct - 0.0).abs() < f64::EPSILON);
        }
    }
}
