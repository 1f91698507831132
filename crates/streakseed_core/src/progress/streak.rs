//! Streak calculation.

use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Counts consecutive completed days ending at `today`.
///
/// Walks backwards from `today` and stops at the first missing day, so the
/// cost is proportional to the streak length. An empty history yields 0, and
/// a history that does not include `today` yields 0 as well.
pub fn current_streak(history: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut streak = 0;
    let mut day = today;
    while history.contains(&day) {
        streak += 1;
        match day.pred_opt() {
            Some(previous) => day = previous,
            None => break,
        }
    }
    streak
}

/// Longest run of consecutive days anywhere in `history`.
pub fn longest_streak(history: &BTreeSet<NaiveDate>) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;
    for day in history {
        run = match previous.and_then(|prev| prev.succ_opt()) {
            Some(expected) if expected == *day => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(*day);
    }
    longest
}
