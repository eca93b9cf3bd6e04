mod render;
mod session;
mod storage;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use daylinks_game::{
    DateKey, DayRecord, FallbackPolicy, FixedClock, Puzzle, PuzzleCatalog, STORAGE_KEY, Selection,
    date_key_at, load_from, ms_until_next_boundary, share_text, validate_json,
};
use std::fs;
use std::io::{Write, stdout};
use std::path::PathBuf;
use std::process::ExitCode;

use render::{
    countdown_text, render_day, render_fallback_notice, render_placeholders, render_report,
    render_stats,
};
use session::{Refusal, Session};
use storage::FileStorage;

#[derive(Debug, Parser)]
#[command(name = "daylinks", version)]
#[command(about = "Play today's Daylinks puzzle and manage the puzzle catalog")]
struct Args {
    /// Puzzle catalog (JSON array of puzzles)
    #[arg(long, env = "DAYLINKS_PUZZLES", default_value = "daylinks-game/data/puzzles.json")]
    puzzles: PathBuf,

    /// Directory holding saved progress
    #[arg(long, env = "DAYLINKS_STATE_DIR", default_value = ".daylinks")]
    state_dir: PathBuf,

    /// Play a specific date instead of today (YYYY-MM-DD)
    #[arg(long)]
    date: Option<DateKey>,

    /// Pretend the current instant is this RFC 3339 timestamp
    #[arg(long)]
    now: Option<DateTime<Utc>>,

    /// Serve the latest puzzle when the date has none
    #[arg(long, env = "DAYLINKS_DEV_FALLBACK")]
    dev_fallback: bool,

    /// End the day on the first wrong guess
    #[arg(long)]
    end_on_miss: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Start (or resume) today's puzzle
    Today,
    /// Show saved progress without starting the day
    Show,
    /// Reveal the next clue
    Clue,
    /// Toggle elimination of an option (id or label)
    Eliminate { option: String },
    /// Guess an option (id or label)
    Guess { option: String },
    /// Give up and reveal the answer (final clue only)
    Reveal,
    /// Print lifetime stats
    Stats,
    /// Time until the next puzzle
    Countdown,
    /// Print share text for a finished day
    Share {
        /// Link appended to the share text
        #[arg(long)]
        link: Option<String>,
    },
    /// Check the puzzle catalog for content issues
    Validate,
    /// List placeholder puzzles still to be written
    List,
}

fn main() -> Result<ExitCode> {
    env_logger::init();
    let args = Args::parse();
    let now = args.now.unwrap_or_else(Utc::now);
    let command = args.command.clone().unwrap_or(Command::Today);
    let mut out = stdout().lock();

    match command {
        Command::Countdown => {
            writeln!(
                out,
                "Next puzzle in {}",
                countdown_text(ms_until_next_boundary(now))
            )?;
            return Ok(ExitCode::SUCCESS);
        }
        Command::Stats => {
            let state = load_from(&FileStorage::new(&args.state_dir));
            render_stats(&mut out, &state.stats)?;
            return Ok(ExitCode::SUCCESS);
        }
        _ => {}
    }

    let raw = fs::read_to_string(&args.puzzles)
        .with_context(|| format!("reading puzzles from {}", args.puzzles.display()))?;
    if matches!(command, Command::Validate) {
        let report = validate_json(&raw)
            .with_context(|| format!("checking puzzles in {}", args.puzzles.display()))?;
        render_report(&mut out, &report)?;
        return Ok(exit_for(report.is_clean()));
    }

    let catalog = PuzzleCatalog::from_json(&raw)
        .with_context(|| format!("parsing puzzles in {}", args.puzzles.display()))?;
    match command {
        Command::List => {
            render_placeholders(&mut out, &catalog)?;
            Ok(ExitCode::SUCCESS)
        }
        command => play(&args, &catalog, command, now, &mut out),
    }
}

const fn exit_for(ok: bool) -> ExitCode {
    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

fn play(
    args: &Args,
    catalog: &PuzzleCatalog,
    command: Command,
    now: DateTime<Utc>,
    out: &mut dyn Write,
) -> Result<ExitCode> {
    let requested = args.date.unwrap_or_else(|| date_key_at(now));
    let policy = if args.dev_fallback {
        FallbackPolicy::Latest
    } else {
        FallbackPolicy::Strict
    };
    let Some(selection) = catalog.puzzle_for_date(requested, policy) else {
        eprintln!(
            "{}",
            format!("No puzzle scheduled for {requested}. Try --dev-fallback.").red()
        );
        return Ok(ExitCode::FAILURE);
    };
    let puzzle = selection.puzzle();
    if let Selection::Fallback { requested, .. } = selection {
        render_fallback_notice(out, requested, puzzle)?;
    }

    let storage = FileStorage::new(&args.state_dir);
    let until_reset = ms_until_next_boundary(now);

    match &command {
        Command::Show => {
            let state = load_from(&storage);
            match state.day(puzzle.date_key) {
                Some(day) => render_day(out, puzzle, day, &state.stats, until_reset)?,
                None => writeln!(out, "Not started yet. Run `daylinks today` to begin.")?,
            }
            return Ok(ExitCode::SUCCESS);
        }
        Command::Share { link } => {
            let state = load_from(&storage);
            return share(out, puzzle, state.day(puzzle.date_key), link.as_deref());
        }
        _ => {}
    }

    let mut session =
        Session::open(storage.clone(), FixedClock(now), puzzle).with_end_on_miss(args.end_on_miss);

    let outcome: Result<Option<String>, Refusal> = match &command {
        Command::Clue => session.next_clue().map(|index| {
            log::debug!("showing clue {} of {}", index + 1, puzzle.max_clues());
            None
        }),
        Command::Eliminate { option } => session.eliminate(option).map(|eliminated| {
            let verb = if eliminated { "Eliminated" } else { "Restored" };
            Some(format!("{verb} {option}."))
        }),
        Command::Guess { option } => session.guess(option).map(|feedback| {
            let line = if feedback.correct {
                "✅ Correct!".green().bold()
            } else if feedback.ended {
                "❌ Not quite. That ends today's puzzle.".red().bold()
            } else {
                "❌ Not quite. Try another option or reveal a clue.".red()
            };
            Some(line.to_string())
        }),
        Command::Reveal => session.reveal().map(|()| None),
        _ => Ok(None),
    };

    if !session.is_durable() {
        eprintln!(
            "{}",
            format!(
                "⚠️  Progress could not be saved to {}",
                storage.path_for(STORAGE_KEY).display()
            )
            .yellow()
        );
    }

    match outcome {
        Ok(Some(message)) => writeln!(out, "{message}")?,
        Ok(None) => {}
        Err(refusal) => {
            eprintln!("{}", refusal.to_string().yellow());
            return Ok(ExitCode::FAILURE);
        }
    }

    if let Some(day) = session.day() {
        writeln!(out)?;
        render_day(out, puzzle, day, &session.state().stats, until_reset)?;
    }
    Ok(ExitCode::SUCCESS)
}

fn share(
    out: &mut dyn Write,
    puzzle: &Puzzle,
    day: Option<&DayRecord>,
    link: Option<&str>,
) -> Result<ExitCode> {
    match day {
        Some(day) if day.is_terminal() => {
            writeln!(out, "{}", share_text(puzzle, day, link))?;
            Ok(ExitCode::SUCCESS)
        }
        _ => {
            eprintln!("{}", "Finish the puzzle before sharing.".yellow());
            Ok(ExitCode::FAILURE)
        }
    }
}
