//! Player progress: per-day records, aggregate stats, and the persisted root.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

use crate::clock::DateKey;
use crate::codec::STATE_VERSION;

/// Status of a day as stored on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    InProgress,
    Solved,
    Revealed,
}

impl DayStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Solved => "solved",
            Self::Revealed => "revealed",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

impl fmt::Display for DayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a day ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Solved,
    Revealed,
}

impl From<Outcome> for DayStatus {
    fn from(value: Outcome) -> Self {
        match value {
            Outcome::Solved => Self::Solved,
            Outcome::Revealed => Self::Revealed,
        }
    }
}

/// Facts stamped when a day reaches a terminal status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub outcome: Outcome,
    pub completed_at: DateTime<Utc>,
    /// Clues visible when the day ended, not the puzzle's total.
    pub clues_used: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayProgress {
    InProgress,
    Completed(Completion),
}

/// Progress on a single date. Created lazily, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DayRecordWire", into = "DayRecordWire")]
pub struct DayRecord {
    pub date_key: DateKey,
    pub puzzle_id: i64,
    pub clue_index: usize,
    pub eliminated: BTreeSet<String>,
    /// Append-only guess history.
    pub guesses: SmallVec<[String; 4]>,
    pub progress: DayProgress,
}

impl DayRecord {
    #[must_use]
    pub fn new(date_key: DateKey, puzzle_id: i64) -> Self {
        Self {
            date_key,
            puzzle_id,
            clue_index: 0,
            eliminated: BTreeSet::new(),
            guesses: SmallVec::new(),
            progress: DayProgress::InProgress,
        }
    }

    #[must_use]
    pub fn status(&self) -> DayStatus {
        self.completion()
            .map_or(DayStatus::InProgress, |done| done.outcome.into())
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self.progress, DayProgress::Completed(_))
    }

    #[must_use]
    pub const fn completion(&self) -> Option<&Completion> {
        match &self.progress {
            DayProgress::InProgress => None,
            DayProgress::Completed(done) => Some(done),
        }
    }

    #[must_use]
    pub fn clues_used(&self) -> Option<u32> {
        self.completion().map(|done| done.clues_used)
    }

    /// Clues on screen: the stamped count once complete, else `clue_index + 1`.
    #[must_use]
    pub fn clues_shown(&self) -> u32 {
        self.clues_used()
            .unwrap_or_else(|| clues_through(self.clue_index))
    }

    #[must_use]
    pub fn is_eliminated(&self, option_id: &str) -> bool {
        self.eliminated.contains(option_id)
    }
}

/// Count of clues visible when the zero-based `clue_index` is showing.
#[must_use]
pub fn clues_through(clue_index: usize) -> u32 {
    u32::try_from(clue_index).map_or(u32::MAX, |i| i.saturating_add(1))
}

/// Aggregate statistics, touched only by the stats aggregator on completion
/// and by day creation (`played`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub played: u32,
    pub completed: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub avg_clues_used: f64,
}

/// Root of everything stored on the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub version: u32,
    pub history: BTreeMap<DateKey, DayRecord>,
    pub stats: Stats,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            history: BTreeMap::new(),
            stats: Stats::default(),
        }
    }
}

impl PersistedState {
    #[must_use]
    pub fn day(&self, date_key: DateKey) -> Option<&DayRecord> {
        self.history.get(&date_key)
    }

    /// Days that reached `solved` or `revealed`.
    pub fn terminal_days(&self) -> impl Iterator<Item = &DayRecord> {
        self.history.values().filter(|day| day.is_terminal())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DayRecordError {
    #[error("day {0} is {1} but has no completion timestamp")]
    MissingCompletedAt(DateKey, DayStatus),
}

/// Flat on-disk shape of a [`DayRecord`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DayRecordWire {
    #[serde(alias = "dateISO")]
    date_key: DateKey,
    puzzle_id: i64,
    status: DayStatus,
    clue_index: usize,
    eliminated_option_ids: Vec<String>,
    guesses: SmallVec<[String; 4]>,
    #[serde(rename = "completedAtISO", default, skip_serializing_if = "Option::is_none")]
    completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    clues_used: Option<u32>,
}

impl TryFrom<DayRecordWire> for DayRecord {
    type Error = DayRecordError;

    fn try_from(wire: DayRecordWire) -> Result<Self, Self::Error> {
        let progress = match wire.status {
            DayStatus::InProgress => DayProgress::InProgress,
            status @ (DayStatus::Solved | DayStatus::Revealed) => {
                let completed_at = wire
                    .completed_at
                    .ok_or(DayRecordError::MissingCompletedAt(wire.date_key, status))?;
                let outcome = if status == DayStatus::Solved {
                    Outcome::Solved
                } else {
                    Outcome::Revealed
                };
                let clues_used = wire
                    .clues_used
                    .unwrap_or_else(|| clues_through(wire.clue_index));
                DayProgress::Completed(Completion {
                    outcome,
                    completed_at,
                    clues_used,
                })
            }
        };
        Ok(Self {
            date_key: wire.date_key,
            puzzle_id: wire.puzzle_id,
            clue_index: wire.clue_index,
            eliminated: wire.eliminated_option_ids.into_iter().collect(),
            guesses: wire.guesses,
            progress,
        })
    }
}

impl From<DayRecord> for DayRecordWire {
    fn from(day: DayRecord) -> Self {
        let status = day.status();
        let (completed_at, clues_used) = match day.progress {
            DayProgress::InProgress => (None, None),
            DayProgress::Completed(done) => (Some(done.completed_at), Some(done.clues_used)),
        };
        Self {
            date_key: day.date_key,
            puzzle_id: day.puzzle_id,
            status,
            clue_index: day.clue_index,
            eliminated_option_ids: day.eliminated.into_iter().collect(),
            guesses: day.guesses,
            completed_at,
            clues_used,
        }
    }
}
