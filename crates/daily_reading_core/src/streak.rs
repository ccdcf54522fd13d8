//! Streak computation over a window of scheduled plan dates.
//!
//! Only dates that carry a plan appear in the input, so a day with nothing
//! scheduled never breaks a run.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Streaks {
    pub current_streak: u32,
    pub longest_streak: u32,
}

/// Computes the current and longest streak.
///
/// `ordered_dates` must be ascending. `longest_streak` is the longest run of
/// consecutive entries that are all in `completed`; `current_streak` counts
/// completed entries backwards from the last one. A repeated date is counted
/// once.
pub fn calculate(ordered_dates: &[NaiveDate], completed: &HashSet<NaiveDate>) -> Streaks {
    let mut seen = HashSet::with_capacity(ordered_dates.len());
    let schedule: Vec<NaiveDate> = ordered_dates
        .iter()
        .copied()
        .filter(|date| seen.insert(*date))
        .collect();

    let mut longest_streak = 0;
    let mut running = 0;
    for date in &schedule {
        if completed.contains(date) {
            running += 1;
            longest_streak = longest_streak.max(running);
        } else {
            running = 0;
        }
    }

    let current_streak = schedule
        .iter()
        .rev()
        .take_while(|date| completed.contains(*date))
        .count() as u32;

    Streaks {
        current_streak,
        longest_streak,
    }
}
