use colored::Colorize;
use daylinks_game::{
    DateKey, DayRecord, DayStatus, Puzzle, PuzzleCatalog, Stats, ValidationReport,
    format_countdown, result_line,
};
use std::io::{self, Write};

fn round1(n: f64) -> String {
    format!("{}", (n * 10.0).round() / 10.0)
}

pub fn countdown_text(ms: u64) -> String {
    format_countdown(i64::try_from(ms).unwrap_or(i64::MAX))
}

pub fn render_fallback_notice(out: &mut dyn Write, requested: DateKey, puzzle: &Puzzle) -> io::Result<()> {
    writeln!(
        out,
        "{}",
        format!(
            "Dev fallback: no puzzle for {requested}, showing {}.",
            puzzle.date_key
        )
        .yellow()
    )
}

/// Clue, options and, once finished, the answer.
pub fn render_day(
    out: &mut dyn Write,
    puzzle: &Puzzle,
    day: &DayRecord,
    stats: &Stats,
    until_reset_ms: u64,
) -> io::Result<()> {
    let total = puzzle.max_clues();
    let shown = day.clue_index.saturating_add(1);
    writeln!(
        out,
        "{} #{}  {}",
        "Daylinks".bright_cyan().bold(),
        puzzle.id,
        puzzle.date_key.to_string().dimmed()
    )?;
    writeln!(
        out,
        "🔥 {} streak    Clue {}/{}",
        stats.current_streak,
        shown.min(total.max(1)),
        total
    )?;
    writeln!(out)?;

    if day.is_terminal() {
        for (i, clue) in puzzle.clues.iter().take(total).enumerate() {
            writeln!(out, "  {}. {clue}", i + 1)?;
        }
    } else {
        for (i, clue) in puzzle.clues.iter().take(shown).enumerate() {
            let line = format!("  {}. {clue}", i + 1);
            if i + 1 == shown.min(puzzle.clues.len()) {
                writeln!(out, "{}", line.bold())?;
            } else {
                writeln!(out, "{}", line.dimmed())?;
            }
        }
    }
    writeln!(out)?;

    for option in &puzzle.options {
        let tile = format!("[{}] {}", option.id, option.label);
        if day.is_eliminated(&option.id) {
            writeln!(out, "  {}", tile.strikethrough().dimmed())?;
        } else if day.is_terminal() && puzzle.is_answer(&option.id) {
            writeln!(out, "  {}", tile.green().bold())?;
        } else {
            writeln!(out, "  {tile}")?;
        }
    }
    writeln!(out)?;

    match day.status() {
        DayStatus::InProgress => {
            if !day.guesses.is_empty() {
                writeln!(out, "Guesses so far: {}", day.guesses.join(", "))?;
            }
        }
        DayStatus::Solved | DayStatus::Revealed => {
            writeln!(out, "{}", result_line(day).bold())?;
            writeln!(out, "Answer: {}", puzzle.answer_label().unwrap_or("?"))?;
            writeln!(out, "{}", puzzle.explanation)?;
            writeln!(out)?;
            writeln!(out, "Come back tomorrow for the next puzzle.")?;
            writeln!(out, "Next puzzle in {}", countdown_text(until_reset_ms))?;
        }
    }
    Ok(())
}

pub fn render_stats(out: &mut dyn Write, stats: &Stats) -> io::Result<()> {
    writeln!(out, "{}", "Stats".bright_cyan().bold())?;
    writeln!(out, "  Played          {}", stats.played)?;
    writeln!(out, "  Completed       {}", stats.completed)?;
    writeln!(out, "  Current streak  {}", stats.current_streak)?;
    writeln!(out, "  Longest streak  {}", stats.longest_streak)?;
    writeln!(out, "  Avg clues       {}", round1(stats.avg_clues_used))?;
    Ok(())
}

pub fn render_report(out: &mut dyn Write, report: &ValidationReport) -> io::Result<()> {
    if report.is_clean() {
        writeln!(
            out,
            "{}",
            format!("✅ Puzzle validation passed ({} puzzle(s))", report.checked).green()
        )?;
        return Ok(());
    }
    writeln!(
        out,
        "{}",
        format!(
            "❌ Puzzle validation failed ({} puzzle(s) have issues)",
            report.failures.len()
        )
        .red()
        .bold()
    )?;
    for failure in &report.failures {
        writeln!(out, "- {failure}")?;
        for issue in &failure.issues {
            writeln!(out, "   • {issue}")?;
        }
    }
    Ok(())
}

pub fn render_placeholders(out: &mut dyn Write, catalog: &PuzzleCatalog) -> io::Result<()> {
    let placeholders = catalog.placeholders();
    writeln!(out, "Puzzles: {}", catalog.len())?;
    writeln!(out, "Real:    {}", catalog.len() - placeholders.len())?;
    writeln!(out, "Todo:    {}", placeholders.len())?;
    writeln!(out)?;
    if placeholders.is_empty() {
        writeln!(out, "{}", "✅ No placeholders found.".green())?;
        return Ok(());
    }
    writeln!(out, "Placeholder dates:")?;
    for puzzle in placeholders {
        writeln!(out, "- {}  (#{})", puzzle.date_key, puzzle.id)?;
    }
    Ok(())
}
