//! Puzzle records as supplied by the content catalog.
use serde::{Deserialize, Serialize};

use crate::clock::DateKey;

/// Upper bound on clues a day may reveal, whatever the record carries.
pub const MAX_CLUES: usize = 5;

/// One selectable answer tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleOption {
    pub id: String,
    pub label: String,
}

/// A daily puzzle. Read-only to the engine.
///
/// Content invariants (9–16 options, 3–5 clues, answer among the options) are
/// checked by [`crate::catalog::validate_puzzles`], not here; a record that
/// breaks them still plays without panicking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Puzzle {
    pub id: i64,
    #[serde(alias = "dateISO")]
    pub date_key: DateKey,
    pub options: Vec<PuzzleOption>,
    pub answer_option_id: String,
    pub clues: Vec<String>,
    pub explanation: String,
}

impl Puzzle {
    /// Number of clues a player can see, capped at [`MAX_CLUES`].
    #[must_use]
    pub fn max_clues(&self) -> usize {
        self.clues.len().min(MAX_CLUES)
    }

    /// Highest reachable zero-based clue index.
    #[must_use]
    pub fn last_clue_index(&self) -> usize {
        self.max_clues().saturating_sub(1)
    }

    /// Clue text at `index`, falling back to the first clue.
    #[must_use]
    pub fn clue(&self, index: usize) -> Option<&str> {
        self.clues
            .get(index)
            .or_else(|| self.clues.first())
            .map(String::as_str)
    }

    #[must_use]
    pub fn option(&self, option_id: &str) -> Option<&PuzzleOption> {
        self.options.iter().find(|opt| opt.id == option_id)
    }

    #[must_use]
    pub fn is_answer(&self, option_id: &str) -> bool {
        option_id == self.answer_option_id
    }

    #[must_use]
    pub fn answer_label(&self) -> Option<&str> {
        self.option(&self.answer_option_id)
            .map(|opt| opt.label.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_record_shape() {
        let json = r#"{
            "id": 1,
            "dateKey": "2025-12-17",
            "options": [{"id": "a", "label": "Option A"}, {"id": "b", "label": "Option B"}],
            "answerOptionId": "a",
            "clues": ["one", "two", "three"],
            "explanation": "Because."
        }"#;
        let puzzle: Puzzle = serde_json::from_str(json).unwrap();
        assert_eq!(puzzle.date_key.to_string(), "2025-12-17");
        assert_eq!(puzzle.answer_label(), Some("Option A"));
        assert_eq!(puzzle.max_clues(), 3);
        assert_eq!(puzzle.last_clue_index(), 2);
    }

    #[test]
    fn accepts_legacy_date_field() {
        let json = r#"{"id": 2, "dateISO": "2025-12-18", "options": [],
            "answerOptionId": "x", "clues": [], "explanation": ""}"#;
        let puzzle: Puzzle = serde_json::from_str(json).unwrap();
        assert_eq!(puzzle.date_key.to_string(), "2025-12-18");
        assert_eq!(puzzle.max_clues(), 0);
        assert_eq!(puzzle.last_clue_index(), 0);
        assert_eq!(puzzle.clue(0), None);
        assert_eq!(puzzle.answer_label(), None);
    }

    #[test]
    fn clues_are_capped_at_five() {
        let puzzle = Puzzle {
            id: 3,
            date_key: "2025-12-19".parse().unwrap(),
            options: Vec::new(),
            answer_option_id: "a".into(),
            clues: (1..=7).map(|n| format!("clue {n}")).collect(),
            explanation: String::new(),
        };
        assert_eq!(puzzle.max_clues(), MAX_CLUES);
        assert_eq!(puzzle.clue(6), Some("clue 7"));
        assert_eq!(puzzle.clue(99), Some("clue 1"));
    }
}
