//! Daylinks Game Engine
//!
//! Platform-agnostic core of the Daylinks daily trivia-elimination game.
//! This crate owns the day-state transitions, streak and average stats, the
//! civil-calendar day clock, and the versioned persisted-state codec, without
//! UI or platform-specific storage.

pub mod catalog;
pub mod clock;
pub mod codec;
pub mod engine;
pub mod puzzle;
pub mod share;
pub mod state;
pub mod stats;

// Re-export commonly used types
pub use catalog::{
    CatalogError, ContentIssue, FallbackPolicy, PuzzleCatalog, PuzzleReport, Selection,
    ValidationReport, is_placeholder, puzzle_issues, record_issues, validate_json, validate_puzzles,
    validate_records,
};
pub use clock::{
    Clock, DateKey, DateKeyError, FixedClock, GAME_TZ, SystemClock, date_key_at, format_countdown,
    ms_until_next_boundary, next_boundary, previous_date_key, today,
};
pub use codec::{
    CodecError, MemoryStorage, STATE_VERSION, STORAGE_KEY, StateStorage, decode, default_state,
    encode, load, load_from, save,
};
pub use engine::{Action, DayEngine, EliminationToggle, GuessResult, Transition};
pub use puzzle::{MAX_CLUES, Puzzle, PuzzleOption};
pub use share::{result_line, share_text};
pub use state::{
    Completion, DayProgress, DayRecord, DayStatus, Outcome, PersistedState, Stats,
};
pub use stats::{average_clues_used, record_completion, streak_continues, update_streak};
