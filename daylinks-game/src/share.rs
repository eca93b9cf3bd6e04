//! Shareable summaries of a day's result.
use crate::puzzle::Puzzle;
use crate::state::{DayRecord, DayStatus};

pub const GAME_TITLE: &str = "Daylinks";

fn clue_word(count: u32) -> &'static str {
    if count == 1 { "clue" } else { "clues" }
}

/// One-line summary such as `Solved in 2 clues`.
#[must_use]
pub fn result_line(day: &DayRecord) -> String {
    let used = day.clues_shown();
    let verb = match day.status() {
        DayStatus::Solved => "Solved in",
        DayStatus::Revealed => "Revealed after",
        DayStatus::InProgress => "In progress at",
    };
    format!("{verb} {used} {}", clue_word(used))
}

/// Text a player pastes elsewhere, optionally followed by a link.
#[must_use]
pub fn share_text(puzzle: &Puzzle, day: &DayRecord, link: Option<&str>) -> String {
    let mut text = format!("{GAME_TITLE} #{}\n{}", puzzle.id, result_line(day));
    if let Some(link) = link {
        text.push('\n');
        text.push_str(link);
    }
    text
}
