//! Day boundaries in the fixed civil calendar.
//!
//! Every date is derived from calendar fields in `Europe/London`, never from a
//! fixed UTC offset, so keys and countdowns stay correct across the clock
//! changes in March and October.
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Europe::London;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Civil timezone that anchors every puzzle day.
pub const GAME_TZ: Tz = London;

const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Error raised when a string is not a valid `YYYY-MM-DD` date key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid date key {0:?}: expected YYYY-MM-DD")]
pub struct DateKeyError(pub String);

/// A calendar date rendered as `YYYY-MM-DD`, used to key puzzles and progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateKey(NaiveDate);

impl DateKey {
    #[must_use]
    pub const fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    #[must_use]
    pub const fn date(self) -> NaiveDate {
        self.0
    }

    /// The key exactly one civil day earlier.
    #[must_use]
    pub fn previous(self) -> Self {
        self.minus_days(1)
    }

    /// Calendar-safe subtraction; saturates at the earliest representable date.
    #[must_use]
    pub fn minus_days(self, days: u64) -> Self {
        Self(
            self.0
                .checked_sub_days(chrono::Days::new(days))
                .unwrap_or(NaiveDate::MIN),
        )
    }

    #[must_use]
    pub fn plus_days(self, days: u64) -> Self {
        Self(
            self.0
                .checked_add_days(chrono::Days::new(days))
                .unwrap_or(NaiveDate::MAX),
        )
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_KEY_FORMAT))
    }
}

impl FromStr for DateKey {
    type Err = DateKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // chrono accepts unpadded fields, the key format does not
        let shaped = s.len() == 10
            && s.bytes().enumerate().all(|(i, b)| match i {
                4 | 7 => b == b'-',
                _ => b.is_ascii_digit(),
            });
        if !shaped {
            return Err(DateKeyError(s.to_string()));
        }
        NaiveDate::parse_from_str(s, DATE_KEY_FORMAT)
            .map(Self)
            .map_err(|_| DateKeyError(s.to_string()))
    }
}

impl TryFrom<String> for DateKey {
    type Error = DateKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DateKey> for String {
    fn from(value: DateKey) -> Self {
        value.to_string()
    }
}

/// Source of the current instant.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time from the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to one instant (tests, replays, `--now` overrides).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Today's key in the game timezone.
#[must_use]
pub fn today() -> DateKey {
    date_key_at(Utc::now())
}

/// The game-calendar date containing `now`.
#[must_use]
pub fn date_key_at(now: DateTime<Utc>) -> DateKey {
    DateKey(now.with_timezone(&GAME_TZ).date_naive())
}

#[must_use]
pub fn previous_date_key(key: DateKey) -> DateKey {
    key.previous()
}

/// Milliseconds from `now` until the next local midnight in the game timezone.
///
/// Recomputed from calendar parts on every call.
#[must_use]
pub fn ms_until_next_boundary(now: DateTime<Utc>) -> u64 {
    let next = next_boundary(now);
    u64::try_from((next - now).num_milliseconds()).unwrap_or(0)
}

/// The instant at which the day containing `now` ends.
#[must_use]
pub fn next_boundary(now: DateTime<Utc>) -> DateTime<Utc> {
    let tomorrow = date_key_at(now).plus_days(1).date();
    // Walk forward past a gap should a transition ever land on midnight.
    (0..3)
        .filter_map(|hour| NaiveTime::from_hms_opt(hour, 0, 0))
        .find_map(|time| GAME_TZ.from_local_datetime(&tomorrow.and_time(time)).earliest())
        .map_or_else(
            || Utc.from_utc_datetime(&tomorrow.and_time(NaiveTime::default())),
            |local| local.with_timezone(&Utc),
        )
}

/// Render a countdown as `HH:MM:SS`.
#[must_use]
pub fn format_countdown(ms: i64) -> String {
    let total_seconds = ms.max(0) / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
