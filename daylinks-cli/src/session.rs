//! Terminal play session: engine calls composed with the client's own rules.
//!
//! The engine never refuses an action; the refusals here (acting on a finished
//! day, revealing before the final clue) are front-end policy.
use daylinks_game::{
    Clock, DayEngine, DayRecord, PersistedState, Puzzle, PuzzleOption, StateStorage, load_from,
    save,
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Refusal {
    #[error("today's puzzle is already complete")]
    DayComplete,
    #[error("could not load today's state")]
    MissingDay,
    #[error("already showing the last clue")]
    NoMoreClues,
    #[error("reveal becomes available on the final clue ({shown}/{total})")]
    RevealLocked { shown: usize, total: usize },
    #[error("no option matches {0:?}")]
    UnknownOption(String),
}

/// Result of a guess as the player sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuessFeedback {
    pub correct: bool,
    /// The day ended, either solved or revealed by the end-on-miss rule.
    pub ended: bool,
}

pub struct Session<'p, S, C> {
    storage: S,
    engine: DayEngine<C>,
    puzzle: &'p Puzzle,
    state: PersistedState,
    end_on_miss: bool,
    durable: bool,
}

impl<'p, S: StateStorage, C: Clock> Session<'p, S, C> {
    /// Load stored progress and make sure today's record exists.
    pub fn open(storage: S, clock: C, puzzle: &'p Puzzle) -> Self {
        let engine = DayEngine::new(clock);
        let stored = load_from(&storage);
        let mut session = Self {
            storage,
            engine,
            puzzle,
            state: stored.clone(),
            end_on_miss: false,
            durable: true,
        };
        let started = session.engine.get_or_create_day(&stored, puzzle);
        if started != stored {
            session.commit(started);
        }
        session
    }

    /// End the day on the first wrong guess instead of allowing retries.
    #[must_use]
    pub fn with_end_on_miss(mut self, end_on_miss: bool) -> Self {
        self.end_on_miss = end_on_miss;
        self
    }

    pub const fn state(&self) -> &PersistedState {
        &self.state
    }

    pub fn day(&self) -> Option<&DayRecord> {
        self.state.day(self.puzzle.date_key)
    }

    /// Whether the last write reached storage.
    pub const fn is_durable(&self) -> bool {
        self.durable
    }

    pub fn next_clue(&mut self) -> Result<usize, Refusal> {
        let day = self.open_day()?;
        if day.clue_index >= self.puzzle.last_clue_index() {
            return Err(Refusal::NoMoreClues);
        }
        let next = self.engine.next_clue(&self.state, self.puzzle);
        self.commit(next);
        Ok(self.day().map_or(0, |d| d.clue_index))
    }

    /// Toggle elimination of the option named by `input`; returns whether it
    /// is now eliminated.
    pub fn eliminate(&mut self, input: &str) -> Result<bool, Refusal> {
        self.open_day()?;
        let option_id = self.resolve(input)?.id.clone();
        let toggled = self
            .engine
            .toggle_elimination(&self.state, self.puzzle, &option_id);
        self.commit(toggled.state);
        Ok(self.day().is_some_and(|d| d.is_eliminated(&option_id)))
    }

    pub fn guess(&mut self, input: &str) -> Result<GuessFeedback, Refusal> {
        self.open_day()?;
        let option_id = self.resolve(input)?.id.clone();
        let result = self
            .engine
            .submit_guess(&self.state, self.puzzle, &option_id);
        let mut next = result.state;
        if !result.correct && self.end_on_miss {
            next = self.engine.reveal_answer(&next, self.puzzle);
        }
        self.commit(next);
        Ok(GuessFeedback {
            correct: result.correct,
            ended: self.day().is_some_and(DayRecord::is_terminal),
        })
    }

    pub fn reveal(&mut self) -> Result<(), Refusal> {
        let day = self.open_day()?;
        let total = self.puzzle.max_clues();
        let shown = day.clue_index.saturating_add(1);
        if shown < total {
            return Err(Refusal::RevealLocked { shown, total });
        }
        let next = self.engine.reveal_answer(&self.state, self.puzzle);
        self.commit(next);
        Ok(())
    }

    fn open_day(&self) -> Result<&DayRecord, Refusal> {
        let day = self.day().ok_or(Refusal::MissingDay)?;
        if day.is_terminal() {
            return Err(Refusal::DayComplete);
        }
        Ok(day)
    }

    fn resolve(&self, input: &str) -> Result<&'p PuzzleOption, Refusal> {
        resolve_option(self.puzzle, input).ok_or_else(|| Refusal::UnknownOption(input.to_string()))
    }

    fn commit(&mut self, next: PersistedState) {
        self.state = next;
        self.durable = save(&self.storage, &self.state).is_ok();
    }
}

/// Match an option by id, then by label ignoring case.
pub fn resolve_option<'p>(puzzle: &'p Puzzle, input: &str) -> Option<&'p PuzzleOption> {
    let needle = input.trim();
    puzzle.option(needle).or_else(|| {
        puzzle
            .options
            .iter()
            .find(|opt| opt.label.trim().eq_ignore_ascii_case(needle))
    })
}
