use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::io::Write;

use scoreboard_core::store::format_real;
use scoreboard_core::{MergeOutcome, PlayerId, RankingEntry};

/// The player whose session was just recorded, for highlighting.
#[derive(Debug, Clone)]
pub struct Highlight<'a> {
    pub player_id: &'a PlayerId,
    pub outcome: &'a MergeOutcome,
    pub rank: Option<usize>,
}

#[derive(Serialize)]
struct JsonSession<'a> {
    player_id: &'a PlayerId,
    new_best: bool,
    rank: Option<usize>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    session: Option<JsonSession<'a>>,
    standings: &'a [RankingEntry],
}

const COLUMNS: [&str; 6] = ["#", "Player", "Level", "Progress (%)", "Time (s)", "Score"];

fn row_cells(entry: &RankingEntry) -> [String; 6] {
    [
        entry.rank.to_string(),
        entry.run.player_id.to_string(),
        entry.run.level.to_string(),
        format!("{:.1}", entry.run.progress_pct),
        format!("{:.2}", entry.run.elapsed_seconds),
        format!("{:.2}", entry.run.score),
    ]
}

fn session_line(highlight: &Highlight<'_>) -> String {
    let verdict = match highlight.outcome {
        MergeOutcome::Inserted => "first run recorded",
        MergeOutcome::Replaced { .. } => "new personal best",
        MergeOutcome::Retained { .. } => "previous best kept",
    };
    let rank = highlight
        .rank
        .map_or_else(|| "unranked".to_string(), |r| format!("rank #{r}"));
    format!("{}: {verdict} ({rank})", highlight.player_id)
}

pub fn generate_console_report<W: Write>(
    out: &mut W,
    standings: &[RankingEntry],
    highlight: Option<&Highlight<'_>>,
) -> Result<()> {
    writeln!(out, "{}", "🏆 Player Standings".bright_cyan().bold())?;
    writeln!(out, "{}", "===================".cyan())?;

    if let Some(highlight) = highlight {
        let line = session_line(highlight);
        if highlight.outcome.is_new_best() {
            writeln!(out, "{}", line.green())?;
        } else {
            writeln!(out, "{}", line.yellow())?;
        }
        writeln!(out)?;
    }

    if standings.is_empty() {
        writeln!(out, "No runs recorded yet.")?;
        return Ok(());
    }

    let rows: Vec<[String; 6]> = standings.iter().map(row_cells).collect();
    let mut widths = COLUMNS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let header = COLUMNS
        .iter()
        .zip(widths)
        .map(|(name, width)| format!("{name:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    writeln!(out, "{}", header.yellow().bold())?;

    for (entry, row) in standings.iter().zip(&rows) {
        let line = row
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ");
        let is_current = highlight.is_some_and(|h| *h.player_id == entry.run.player_id);
        if is_current {
            writeln!(out, "{}", line.bright_green().bold())?;
        } else {
            writeln!(out, "{line}")?;
        }
    }
    Ok(())
}

pub fn generate_json_report<W: Write>(
    out: &mut W,
    standings: &[RankingEntry],
    highlight: Option<&Highlight<'_>>,
) -> Result<()> {
    let report = JsonReport {
        session: highlight.map(|h| JsonSession {
            player_id: h.player_id,
            new_best: h.outcome.is_new_best(),
            rank: h.rank,
        }),
        standings,
    };
    let json_output = serde_json::to_string_pretty(&report)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report<W: Write>(
    out: &mut W,
    standings: &[RankingEntry],
    highlight: Option<&Highlight<'_>>,
) -> Result<()> {
    writeln!(out, "# Player Standings\n")?;
    if let Some(highlight) = highlight {
        writeln!(out, "- **Session**: {}\n", session_line(highlight))?;
    }
    if standings.is_empty() {
        writeln!(out, "_No runs recorded yet._")?;
        return Ok(());
    }
    writeln!(out, "| {} |", COLUMNS.join(" | "))?;
    writeln!(out, "|{}", "---|".repeat(COLUMNS.len()))?;
    for entry in standings {
        let cells = row_cells(entry);
        let is_current = highlight.is_some_and(|h| *h.player_id == entry.run.player_id);
        if is_current {
            let bold: Vec<String> = cells.iter().map(|c| format!("**{c}**")).collect();
            writeln!(out, "| {} |", bold.join(" | "))?;
        } else {
            writeln!(out, "| {} |", cells.join(" | "))?;
        }
    }
    Ok(())
}

/// Standings as CSV with a leading rank column; reals use the store's format.
pub fn generate_csv_report<W: Write>(out: &mut W, standings: &[RankingEntry]) -> Result<()> {
    writeln!(out, "rank,player_id,level,progress_pct,elapsed_seconds,score")?;
    for entry in standings {
        writeln!(
            out,
            "{},{},{},{},{},{}",
            entry.rank,
            entry.run.player_id,
            entry.run.level,
            format_real(entry.run.progress_pct),
            format_real(entry.run.elapsed_seconds),
            format_real(entry.run.score),
        )?;
    }
    Ok(())
}
