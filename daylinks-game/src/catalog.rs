//! Puzzle catalog: date lookup, content validation, placeholder detection.
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::ops::RangeInclusive;
use thiserror::Error;

use crate::clock::DateKey;
use crate::puzzle::Puzzle;

/// Allowed number of options per puzzle.
pub const OPTION_COUNT: RangeInclusive<usize> = 9..=16;
/// Allowed number of clues per puzzle.
pub const CLUE_COUNT: RangeInclusive<usize> = 3..=5;

const PLACEHOLDER_CLUE: &str = "Placeholder clue";
const PLACEHOLDER_EXPLANATION: &str = "Placeholder explanation";

static DEFAULT_OPTION_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Option [A-L]$").expect("static regex"));

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("puzzle catalog is not a valid puzzle array: {0}")]
    Parse(#[from] serde_json::Error),
}

/// What to serve when no puzzle is scheduled for the requested date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Serve nothing.
    #[default]
    Strict,
    /// Serve the latest-dated puzzle (development builds).
    Latest,
}

/// A puzzle chosen for a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection<'a> {
    Exact(&'a Puzzle),
    Fallback {
        puzzle: &'a Puzzle,
        requested: DateKey,
    },
}

impl<'a> Selection<'a> {
    #[must_use]
    pub const fn puzzle(&self) -> &'a Puzzle {
        match self {
            Self::Exact(puzzle) | Self::Fallback { puzzle, .. } => puzzle,
        }
    }

    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PuzzleCatalog {
    puzzles: Vec<Puzzle>,
}

impl PuzzleCatalog {
    /// Parse a JSON array of puzzle records.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is not an array of well-formed records.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Ok(Self {
            puzzles: serde_json::from_str(json)?,
        })
    }

    #[must_use]
    pub const fn from_puzzles(puzzles: Vec<Puzzle>) -> Self {
        Self { puzzles }
    }

    #[must_use]
    pub fn puzzles(&self) -> &[Puzzle] {
        &self.puzzles
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.puzzles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.puzzles.is_empty()
    }

    #[must_use]
    pub fn by_date(&self, date_key: DateKey) -> Option<&Puzzle> {
        self.puzzles.iter().find(|p| p.date_key == date_key)
    }

    /// Puzzle for `date_key`, or a fallback when `policy` allows one.
    #[must_use]
    pub fn puzzle_for_date(&self, date_key: DateKey, policy: FallbackPolicy) -> Option<Selection<'_>> {
        if let Some(puzzle) = self.by_date(date_key) {
            return Some(Selection::Exact(puzzle));
        }
        match policy {
            FallbackPolicy::Strict => None,
            FallbackPolicy::Latest => self
                .puzzles
                .iter()
                .max_by_key(|p| p.date_key)
                .map(|puzzle| Selection::Fallback {
                    puzzle,
                    requested: date_key,
                }),
        }
    }

    /// Check every record and the catalog-wide uniqueness of ids and dates.
    #[must_use]
    pub fn validate(&self) -> ValidationReport {
        validate_puzzles(&self.puzzles)
    }

    /// Puzzles still holding generated placeholder content, sorted by date.
    #[must_use]
    pub fn placeholders(&self) -> Vec<&Puzzle> {
        let mut found: Vec<&Puzzle> = self.puzzles.iter().filter(|p| is_placeholder(p)).collect();
        found.sort_by_key(|p| p.date_key);
        found
    }
}

/// A single content rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentIssue {
    #[error("record must be an object")]
    NotAnObject,
    #[error("{0} is missing")]
    MissingField(&'static str),
    #[error("{field} must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("dateKey must be YYYY-MM-DD (got {0})")]
    InvalidDate(String),
    #[error("options must be 9–16 items (got {0})")]
    OptionCount(usize),
    #[error("option must be an object")]
    OptionNotAnObject,
    #[error("option.id must be a non-empty string")]
    EmptyOptionId,
    #[error("option.label must be a non-empty string")]
    EmptyOptionLabel,
    #[error("duplicate option.id {0:?}")]
    DuplicateOptionId(String),
    #[error("duplicate option.label {0:?} (case-insensitive)")]
    DuplicateOptionLabel(String),
    #[error("answerOptionId must be a non-empty string")]
    EmptyAnswer,
    #[error("answerOptionId {0:?} not found in options")]
    AnswerNotInOptions(String),
    #[error("clues must be 3–5 (got {0})")]
    ClueCount(usize),
    #[error("clue {0} must be a non-empty string")]
    EmptyClue(usize),
    #[error("explanation must be a non-empty string")]
    EmptyExplanation,
    #[error("duplicate dateKey {0}")]
    DuplicateDate(DateKey),
    #[error("duplicate id {0}")]
    DuplicateId(i64),
}

/// Issues found on one record, labelled by whatever id and date it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PuzzleReport {
    pub index: usize,
    pub id: Option<i64>,
    pub date: Option<String>,
    pub issues: Vec<ContentIssue>,
}

impl fmt::Display for PuzzleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "#{id}")?,
            None => f.write_str("#?")?,
        }
        let date = self.date.as_deref().unwrap_or("no-date");
        write!(f, " ({date}) [index {}]", self.index)
    }
}

/// Outcome of validating a catalog. Only records with issues are listed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationReport {
    pub checked: usize,
    pub failures: Vec<PuzzleReport>,
}

impl ValidationReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Validate a catalog file without requiring its records to be well formed.
///
/// # Errors
///
/// Returns an error only if the text is not a JSON array.
pub fn validate_json(json: &str) -> Result<ValidationReport, CatalogError> {
    let records: Vec<Value> = serde_json::from_str(json)?;
    Ok(validate_records(&records))
}

/// Validate typed puzzles; same rules as [`validate_records`].
#[must_use]
pub fn validate_puzzles(puzzles: &[Puzzle]) -> ValidationReport {
    let records: Vec<Value> = puzzles.iter().map(puzzle_value).collect();
    validate_records(&records)
}

/// Validate records in order; duplicates are reported on the later record.
#[must_use]
pub fn validate_records(records: &[Value]) -> ValidationReport {
    let mut dates = HashSet::new();
    let mut ids = HashSet::new();
    let mut failures = Vec::new();

    for (index, record) in records.iter().enumerate() {
        let mut issues = record_issues(record);
        let id = record.get("id").and_then(Value::as_i64);
        let date = record.as_object().and_then(date_field).map(raw_text);

        if let Some(key) = date.as_deref().and_then(|d| d.parse::<DateKey>().ok())
            && !dates.insert(key)
        {
            issues.push(ContentIssue::DuplicateDate(key));
        }
        if let Some(id) = id
            && !ids.insert(id)
        {
            issues.push(ContentIssue::DuplicateId(id));
        }
        if !issues.is_empty() {
            failures.push(PuzzleReport {
                index,
                id,
                date,
                issues,
            });
        }
    }

    ValidationReport {
        checked: records.len(),
        failures,
    }
}

/// Rule violations within a single typed record.
#[must_use]
pub fn puzzle_issues(puzzle: &Puzzle) -> Vec<ContentIssue> {
    record_issues(&puzzle_value(puzzle))
}

/// Rule violations within a single raw record.
#[must_use]
pub fn record_issues(record: &Value) -> Vec<ContentIssue> {
    let Some(fields) = record.as_object() else {
        return vec![ContentIssue::NotAnObject];
    };
    let mut issues = Vec::new();

    match fields.get("id") {
        None => issues.push(ContentIssue::MissingField("id")),
        Some(id) if id.as_i64().is_none() => issues.push(ContentIssue::WrongType {
            field: "id",
            expected: "an integer",
        }),
        Some(_) => {}
    }

    match date_field(fields) {
        None => issues.push(ContentIssue::MissingField("dateKey")),
        Some(date) => {
            if date.as_str().and_then(|d| d.parse::<DateKey>().ok()).is_none() {
                issues.push(ContentIssue::InvalidDate(raw_text(date)));
            }
        }
    }

    let option_ids = match fields.get("options") {
        None => {
            issues.push(ContentIssue::MissingField("options"));
            None
        }
        Some(Value::Array(options)) => Some(option_issues(options, &mut issues)),
        Some(_) => {
            issues.push(ContentIssue::WrongType {
                field: "options",
                expected: "an array",
            });
            None
        }
    };

    match fields.get("answerOptionId") {
        None => issues.push(ContentIssue::MissingField("answerOptionId")),
        Some(Value::String(answer)) => {
            let trimmed = answer.trim();
            if trimmed.is_empty() {
                issues.push(ContentIssue::EmptyAnswer);
            } else if option_ids.is_some_and(|ids| !ids.contains(trimmed)) {
                issues.push(ContentIssue::AnswerNotInOptions(answer.clone()));
            }
        }
        Some(_) => issues.push(ContentIssue::EmptyAnswer),
    }

    match fields.get("clues") {
        None => issues.push(ContentIssue::MissingField("clues")),
        Some(Value::Array(clues)) => {
            if !CLUE_COUNT.contains(&clues.len()) {
                issues.push(ContentIssue::ClueCount(clues.len()));
            }
            for (i, clue) in clues.iter().enumerate() {
                if clue.as_str().map(str::trim).is_none_or(str::is_empty) {
                    issues.push(ContentIssue::EmptyClue(i + 1));
                }
            }
        }
        Some(_) => issues.push(ContentIssue::WrongType {
            field: "clues",
            expected: "an array",
        }),
    }

    match fields.get("explanation") {
        None => issues.push(ContentIssue::MissingField("explanation")),
        Some(text) => {
            if text.as_str().map(str::trim).is_none_or(str::is_empty) {
                issues.push(ContentIssue::EmptyExplanation);
            }
        }
    }

    issues
}

/// Per-option checks; returns the trimmed ids seen.
fn option_issues<'v>(options: &'v [Value], issues: &mut Vec<ContentIssue>) -> HashSet<&'v str> {
    if !OPTION_COUNT.contains(&options.len()) {
        issues.push(ContentIssue::OptionCount(options.len()));
    }

    let mut ids = HashSet::new();
    let mut labels = HashSet::new();
    for option in options {
        let Some(option) = option.as_object() else {
            issues.push(ContentIssue::OptionNotAnObject);
            continue;
        };
        let id = option.get("id").and_then(Value::as_str).map_or("", str::trim);
        let label = option.get("label").and_then(Value::as_str).unwrap_or_default();
        if id.is_empty() {
            issues.push(ContentIssue::EmptyOptionId);
        } else if !ids.insert(id) {
            issues.push(ContentIssue::DuplicateOptionId(id.to_string()));
        }
        let folded = label.trim().to_lowercase();
        if folded.is_empty() {
            issues.push(ContentIssue::EmptyOptionLabel);
        } else if !labels.insert(folded) {
            issues.push(ContentIssue::DuplicateOptionLabel(label.to_string()));
        }
    }
    ids
}

fn date_field(fields: &Map<String, Value>) -> Option<&Value> {
    fields.get("dateKey").or_else(|| fields.get("dateISO"))
}

fn raw_text(value: &Value) -> String {
    value.as_str().map_or_else(|| value.to_string(), str::to_string)
}

fn puzzle_value(puzzle: &Puzzle) -> Value {
    serde_json::to_value(puzzle).unwrap_or(Value::Null)
}

/// Whether a record still carries generated placeholder content.
#[must_use]
pub fn is_placeholder(puzzle: &Puzzle) -> bool {
    puzzle.clues.iter().any(|c| c.contains(PLACEHOLDER_CLUE))
        || puzzle.explanation.contains(PLACEHOLDER_EXPLANATION)
        || puzzle
            .options
            .iter()
            .all(|o| DEFAULT_OPTION_LABEL.is_match(o.label.trim()))
}
