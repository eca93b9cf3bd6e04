//! Day-state engine: pure transitions over [`PersistedState`].
//!
//! Every operation borrows the caller's snapshot and returns a new one; the
//! input is never mutated. Calls against a missing or terminal day return the
//! input unchanged.
use crate::clock::{Clock, SystemClock};
use crate::puzzle::Puzzle;
use crate::state::{Completion, DayProgress, DayRecord, Outcome, PersistedState, clues_through};
use crate::stats::record_completion;

/// Result of [`DayEngine::toggle_elimination`].
#[derive(Debug, Clone, PartialEq)]
pub struct EliminationToggle {
    pub state: PersistedState,
    /// Always `false` from the engine; refusal policies belong to callers.
    pub blocked: bool,
}

/// Result of [`DayEngine::submit_guess`].
#[derive(Debug, Clone, PartialEq)]
pub struct GuessResult {
    pub state: PersistedState,
    pub correct: bool,
}

/// A player action, for callers that prefer a single reducer entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Start,
    NextClue,
    ToggleElimination(String),
    SubmitGuess(String),
    RevealAnswer,
}

/// Output of [`DayEngine::apply`].
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: PersistedState,
    /// Set only for [`Action::SubmitGuess`].
    pub correct: Option<bool>,
    pub blocked: bool,
}

impl Transition {
    fn plain(state: PersistedState) -> Self {
        Self {
            state,
            correct: None,
            blocked: false,
        }
    }
}

/// Stateless engine; the clock only stamps completion times.
#[derive(Debug, Clone, Default)]
pub struct DayEngine<C = SystemClock> {
    clock: C,
}

impl DayEngine<SystemClock> {
    #[must_use]
    pub const fn system() -> Self {
        Self { clock: SystemClock }
    }
}

impl<C: Clock> DayEngine<C> {
    pub const fn new(clock: C) -> Self {
        Self { clock }
    }

    /// Ensure a record exists for the puzzle's date.
    ///
    /// Idempotent: an existing record leaves the state untouched, so `played`
    /// is counted once per date.
    #[must_use]
    pub fn get_or_create_day(&self, state: &PersistedState, puzzle: &Puzzle) -> PersistedState {
        let mut next = state.clone();
        if state.history.contains_key(&puzzle.date_key) {
            return next;
        }
        next.history.insert(
            puzzle.date_key,
            DayRecord::new(puzzle.date_key, puzzle.id),
        );
        next.stats.played = next.stats.played.saturating_add(1);
        log::debug!("Started day {} (puzzle #{})", puzzle.date_key, puzzle.id);
        next
    }

    /// Flip `option_id` in the eliminated set of an in-progress day.
    #[must_use]
    pub fn toggle_elimination(
        &self,
        state: &PersistedState,
        puzzle: &Puzzle,
        option_id: &str,
    ) -> EliminationToggle {
        let state = with_open_day(state, puzzle, |day| {
            if !day.eliminated.remove(option_id) {
                day.eliminated.insert(option_id.to_string());
            }
        })
        .unwrap_or_else(|| state.clone());
        EliminationToggle {
            state,
            blocked: false,
        }
    }

    /// Reveal the next clue, clamped to the last one the puzzle offers.
    #[must_use]
    pub fn next_clue(&self, state: &PersistedState, puzzle: &Puzzle) -> PersistedState {
        with_open_day(state, puzzle, |day| {
            day.clue_index = day
                .clue_index
                .saturating_add(1)
                .min(puzzle.last_clue_index())
                .max(day.clue_index);
        })
        .unwrap_or_else(|| state.clone())
    }

    /// Record a guess; a correct one solves the day.
    ///
    /// A wrong guess leaves the day in progress. Against a missing or terminal
    /// day nothing is recorded and only correctness is reported.
    #[must_use]
    pub fn submit_guess(
        &self,
        state: &PersistedState,
        puzzle: &Puzzle,
        option_id: &str,
    ) -> GuessResult {
        let correct = puzzle.is_answer(option_id);
        let Some(guessed) = with_open_day(state, puzzle, |day| {
            day.guesses.push(option_id.to_string());
        }) else {
            return GuessResult {
                state: state.clone(),
                correct,
            };
        };
        let state = if correct {
            self.complete(guessed, puzzle, Outcome::Solved)
        } else {
            guessed
        };
        GuessResult { state, correct }
    }

    /// Give up on the day, whatever has been guessed so far.
    #[must_use]
    pub fn reveal_answer(&self, state: &PersistedState, puzzle: &Puzzle) -> PersistedState {
        if open_day(state, puzzle).is_none() {
            return state.clone();
        }
        self.complete(state.clone(), puzzle, Outcome::Revealed)
    }

    /// Dispatch an [`Action`].
    #[must_use]
    pub fn apply(&self, state: &PersistedState, puzzle: &Puzzle, action: &Action) -> Transition {
        match action {
            Action::Start => Transition::plain(self.get_or_create_day(state, puzzle)),
            Action::NextClue => Transition::plain(self.next_clue(state, puzzle)),
            Action::ToggleElimination(option_id) => {
                let toggled = self.toggle_elimination(state, puzzle, option_id);
                Transition {
                    state: toggled.state,
                    correct: None,
                    blocked: toggled.blocked,
                }
            }
            Action::SubmitGuess(option_id) => {
                let guess = self.submit_guess(state, puzzle, option_id);
                Transition {
                    state: guess.state,
                    correct: Some(guess.correct),
                    blocked: false,
                }
            }
            Action::RevealAnswer => Transition::plain(self.reveal_answer(state, puzzle)),
        }
    }

    /// Move an in-progress day to a terminal status and refresh stats.
    fn complete(&self, mut state: PersistedState, puzzle: &Puzzle, outcome: Outcome) -> PersistedState {
        let Some(day) = state.history.get_mut(&puzzle.date_key) else {
            return state;
        };
        if day.is_terminal() {
            return state;
        }
        let clues_used = clues_through(day.clue_index);
        day.progress = DayProgress::Completed(Completion {
            outcome,
            completed_at: self.clock.now(),
            clues_used,
        });
        state.stats = record_completion(&state.history, &state.stats, puzzle.date_key);
        log::debug!(
            "Completed day {} as {:?} with {} clue(s); streak {}",
            puzzle.date_key,
            outcome,
            clues_used,
            state.stats.current_streak
        );
        state
    }
}

fn open_day<'a>(state: &'a PersistedState, puzzle: &Puzzle) -> Option<&'a DayRecord> {
    state
        .history
        .get(&puzzle.date_key)
        .filter(|day| !day.is_terminal())
}

/// Copy the state and edit its in-progress day, or `None` if there is none.
fn with_open_day(
    state: &PersistedState,
    puzzle: &Puzzle,
    edit: impl FnOnce(&mut DayRecord),
) -> Option<PersistedState> {
    open_day(state, puzzle)?;
    let mut next = state.clone();
    next.history.get_mut(&puzzle.date_key).map(edit)?;
    Some(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::puzzle::PuzzleOption;
    use crate::state::DayStatus;

    fn engine() -> DayEngine<FixedClock> {
        DayEngine::new(FixedClock("2025-12-17T09:30:00Z".parse().unwrap()))
    }

    fn two_option_puzzle() -> Puzzle {
        Puzzle {
            id: 1,
            date_key: "2025-12-17".parse().unwrap(),
            options: vec![
                PuzzleOption {
                    id: "a".into(),
                    label: "A".into(),
                },
                PuzzleOption {
                    id: "b".into(),
                    label: "B".into(),
                },
            ],
            answer_option_id: "a".into(),
            clues: vec!["Clue 1".into()],
            explanation: "Explanation".into(),
        }
    }

    fn three_clue_puzzle() -> Puzzle {
        Puzzle {
            clues: vec!["one".into(), "two".into(), "three".into()],
            ..two_option_puzzle()
        }
    }

    #[test]
    fn create_day_counts_one_play() {
        let engine = engine();
        let puzzle = two_option_puzzle();
        let once = engine.get_or_create_day(&PersistedState::default(), &puzzle);
        let twice = engine.get_or_create_day(&once, &puzzle);
        assert_eq!(once, twice);
        assert_eq!(twice.stats.played, 1);
        let day = twice.day(puzzle.date_key).unwrap();
        assert_eq!(day.status(), DayStatus::InProgress);
        assert_eq!(day.puzzle_id, 1);
    }

    #[test]
    fn correct_guess_solves() {
        let engine = engine();
        let puzzle = two_option_puzzle();
        let state = engine.get_or_create_day(&PersistedState::default(), &puzzle);
        let result = engine.submit_guess(&state, &puzzle, "a");
        assert!(result.correct);
        let day = result.state.day(puzzle.date_key).unwrap();
        assert_eq!(day.status(), DayStatus::Solved);
        assert_eq!(day.clues_used(), Some(1));
        assert_eq!(
            day.completion().unwrap().completed_at,
            "2025-12-17T09:30:00Z".parse::<chrono::DateTime<chrono::Utc>>().unwrap()
        );
        assert_eq!(result.state.stats.completed, 1);
        assert_eq!(result.state.stats.current_streak, 1);
    }

    #[test]
    fn wrong_guess_stays_in_progress() {
        let engine = engine();
        let puzzle = two_option_puzzle();
        let state = engine.get_or_create_day(&PersistedState::default(), &puzzle);
        let result = engine.submit_guess(&state, &puzzle, "b");
        assert!(!result.correct);
        let day = result.state.day(puzzle.date_key).unwrap();
        assert_eq!(day.status(), DayStatus::InProgress);
        assert_eq!(day.guesses.as_slice(), ["b".to_string()]);
        assert_eq!(result.state.stats.completed, 0);
    }

    #[test]
    fn guess_without_day_reports_without_mutating() {
        let engine = engine();
        let puzzle = two_option_puzzle();
        let state = PersistedState::default();
        let miss = engine.submit_guess(&state, &puzzle, "");
        assert!(!miss.correct);
        assert_eq!(miss.state, state);
        let hit = engine.submit_guess(&state, &puzzle, "a");
        assert!(hit.correct);
        assert_eq!(hit.state, state);
    }

    #[test]
    fn guesses_after_completion_are_not_recorded() {
        let engine = engine();
        let puzzle = two_option_puzzle();
        let state = engine.get_or_create_day(&PersistedState::default(), &puzzle);
        let solved = engine.submit_guess(&state, &puzzle, "a").state;
        let again = engine.submit_guess(&solved, &puzzle, "b");
        assert!(!again.correct);
        assert_eq!(again.state, solved);
        assert_eq!(again.state.stats.completed, 1);
    }

    #[test]
    fn next_clue_clamps_to_last() {
        let engine = engine();
        let puzzle = three_clue_puzzle();
        let mut state = engine.get_or_create_day(&PersistedState::default(), &puzzle);
        for expected in [1, 2, 2, 2] {
            state = engine.next_clue(&state, &puzzle);
            assert_eq!(state.day(puzzle.date_key).unwrap().clue_index, expected);
        }
        let single = two_option_puzzle();
        let state = engine.get_or_create_day(&PersistedState::default(), &single);
        let state = engine.next_clue(&state, &single);
        assert_eq!(state.day(single.date_key).unwrap().clue_index, 0);
    }

    #[test]
    fn next_clue_never_decreases_on_empty_clue_list() {
        let engine = engine();
        let puzzle = Puzzle {
            clues: Vec::new(),
            ..two_option_puzzle()
        };
        let state = engine.get_or_create_day(&PersistedState::default(), &puzzle);
        let state = engine.next_clue(&state, &puzzle);
        assert_eq!(state.day(puzzle.date_key).unwrap().clue_index, 0);
    }

    #[test]
    fn toggle_adds_then_removes() {
        let engine = engine();
        let puzzle = two_option_puzzle();
        let state = engine.get_or_create_day(&PersistedState::default(), &puzzle);
        let first = engine.toggle_elimination(&state, &puzzle, "b");
        assert!(!first.blocked);
        assert!(first.state.day(puzzle.date_key).unwrap().is_eliminated("b"));
        let second = engine.toggle_elimination(&first.state, &puzzle, "b");
        assert_eq!(second.state, state);
    }

    #[test]
    fn terminal_day_ignores_toggle_and_clue() {
        let engine = engine();
        let puzzle = three_clue_puzzle();
        let state = engine.get_or_create_day(&PersistedState::default(), &puzzle);
        let revealed = engine.reveal_answer(&state, &puzzle);
        let toggled = engine.toggle_elimination(&revealed, &puzzle, "a");
        assert!(!toggled.blocked);
        assert_eq!(toggled.state, revealed);
        assert_eq!(engine.next_clue(&revealed, &puzzle), revealed);
        assert_eq!(engine.reveal_answer(&revealed, &puzzle), revealed);
    }

    #[test]
    fn reveal_uses_clues_consumed_not_total() {
        let engine = engine();
        let puzzle = three_clue_puzzle();
        let state = engine.get_or_create_day(&PersistedState::default(), &puzzle);
        let state = engine.next_clue(&state, &puzzle);
        let state = engine.reveal_answer(&state, &puzzle);
        let day = state.day(puzzle.date_key).unwrap();
        assert_eq!(day.status(), DayStatus::Revealed);
        assert_eq!(day.clues_used(), Some(2));
        assert!((state.stats.avg_clues_used - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn operations_on_missing_day_are_noops() {
        let engine = engine();
        let puzzle = two_option_puzzle();
        let state = PersistedState::default();
        assert_eq!(engine.next_clue(&state, &puzzle), state);
        assert_eq!(engine.reveal_answer(&state, &puzzle), state);
        assert_eq!(engine.toggle_elimination(&state, &puzzle, "a").state, state);
    }

    #[test]
    fn apply_dispatches_actions() {
        let engine = engine();
        let puzzle = two_option_puzzle();
        let started = engine.apply(&PersistedState::default(), &puzzle, &Action::Start);
        assert_eq!(started.correct, None);
        let guessed = engine.apply(
            &started.state,
            &puzzle,
            &Action::SubmitGuess("b".into()),
        );
        assert_eq!(guessed.correct, Some(false));
        let revealed = engine.apply(&guessed.state, &puzzle, &Action::RevealAnswer);
        assert_eq!(
            revealed.state.day(puzzle.date_key).unwrap().status(),
            DayStatus::Revealed
        );
    }

    #[test]
    fn caller_snapshot_is_untouched() {
        let engine = engine();
        let puzzle = two_option_puzzle();
        let state = engine.get_or_create_day(&PersistedState::default(), &puzzle);
        let before = state.clone();
        let _ = engine.submit_guess(&state, &puzzle, "a");
        let _ = engine.toggle_elimination(&state, &puzzle, "b");
        assert_eq!(state, before);
    }
}
