//! Aggregate statistics recomputed when a day first reaches a terminal status.
use std::collections::BTreeMap;

use crate::clock::DateKey;
use crate::state::{DayRecord, Stats};

/// Mean of `clues_used` over every terminal day, or `0.0` when there are none.
///
/// Recomputed from the full history rather than maintained incrementally.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn average_clues_used(history: &BTreeMap<DateKey, DayRecord>) -> f64 {
    let (sum, count) = history
        .values()
        .filter_map(DayRecord::clues_used)
        .fold((0u64, 0usize), |(sum, count), used| {
            (sum + u64::from(used), count + 1)
        });
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

/// Whether completing `date_key` extends the current streak: the previous
/// civil day must have a terminal record.
#[must_use]
pub fn streak_continues(history: &BTreeMap<DateKey, DayRecord>, date_key: DateKey) -> bool {
    history
        .get(&date_key.previous())
        .is_some_and(DayRecord::is_terminal)
}

/// Streak counters after completing a day.
#[must_use]
pub fn update_streak(stats: &Stats, continues: bool) -> Stats {
    let current_streak = if continues {
        stats.current_streak.saturating_add(1)
    } else {
        1
    };
    Stats {
        current_streak,
        longest_streak: stats.longest_streak.max(current_streak),
        ..stats.clone()
    }
}

/// Stats after `date_key` transitions into a terminal status.
///
/// `history` must already hold the completed record for `date_key`.
#[must_use]
pub fn record_completion(
    history: &BTreeMap<DateKey, DayRecord>,
    stats: &Stats,
    date_key: DateKey,
) -> Stats {
    let counted = Stats {
        completed: stats.completed.saturating_add(1),
        avg_clues_used: average_clues_used(history),
        ..stats.clone()
    };
    update_streak(&counted, streak_continues(history, date_key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Completion, DayProgress, Outcome};

    fn key(s: &str) -> DateKey {
        s.parse().unwrap()
    }

    fn finished(date: &str, clues_used: u32) -> (DateKey, DayRecord) {
        let k = key(date);
        let mut day = DayRecord::new(k, 1);
        day.progress = DayProgress::Completed(Completion {
            outcome: Outcome::Solved,
            completed_at: "2025-12-17T12:00:00Z".parse().unwrap(),
            clues_used,
        });
        (k, day)
    }

    #[test]
    fn average_is_zero_without_completions() {
        let mut history = BTreeMap::new();
        history.insert(key("2025-12-17"), DayRecord::new(key("2025-12-17"), 1));
        assert!(average_clues_used(&history).abs() < f64::EPSILON);
    }

    #[test]
    fn average_ignores_in_progress_days() {
        let mut history: BTreeMap<_, _> = [
            finished("2025-12-01", 1),
            finished("2025-12-02", 3),
            finished("2025-12-03", 2),
        ]
        .into_iter()
        .collect();
        history.insert(key("2025-12-04"), DayRecord::new(key("2025-12-04"), 4));
        assert!((average_clues_used(&history) - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn streak_needs_terminal_yesterday() {
        let mut history: BTreeMap<_, _> = [finished("2025-12-01", 1)].into_iter().collect();
        assert!(streak_continues(&history, key("2025-12-02")));
        assert!(!streak_continues(&history, key("2025-12-03")));

        history.insert(key("2025-12-02"), DayRecord::new(key("2025-12-02"), 2));
        assert!(!streak_continues(&history, key("2025-12-03")));
    }

    #[test]
    fn update_streak_resets_and_keeps_longest() {
        let stats = Stats {
            current_streak: 4,
            longest_streak: 6,
            ..Stats::default()
        };
        let grown = update_streak(&stats, true);
        assert_eq!((grown.current_streak, grown.longest_streak), (5, 6));
        let broken = update_streak(&grown, false);
        assert_eq!((broken.current_streak, broken.longest_streak), (1, 6));
    }

    #[test]
    fn first_completion_starts_a_streak() {
        let history: BTreeMap<_, _> = [finished("2025-12-17", 2)].into_iter().collect();
        let stats = Stats {
            played: 1,
            ..Stats::default()
        };
        let next = record_completion(&history, &stats, key("2025-12-17"));
        assert_eq!(next.played, 1);
        assert_eq!(next.completed, 1);
        assert_eq!(next.current_streak, 1);
        assert_eq!(next.longest_streak, 1);
        assert!((next.avg_clues_used - 2.0).abs() < f64::EPSILON);
    }
}
