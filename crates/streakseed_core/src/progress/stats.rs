//! Chart and calendar series derived from habit history.
//!
//! Rendering is a UI concern; these functions only produce the data series.

use crate::model::habit::Habit;
use chrono::{Duration, NaiveDate};
use serde::Serialize;

const WEEK_DAYS: i64 = 7;

/// Number of habits completed on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayCount {
    pub date: NaiveDate,
    pub count: u32,
}

/// Completion counts for the seven days ending `today`, oldest first.
pub fn last_seven_days(habits: &[Habit], today: NaiveDate) -> Vec<DayCount> {
    (0..WEEK_DAYS)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            let count = habits.iter().filter(|habit| habit.is_done_on(date)).count();
            DayCount {
                date,
                count: u32::try_from(count).unwrap_or(u32::MAX),
            }
        })
        .collect()
}

/// Calendar cells for a habit heat map.
///
/// Starts at the earliest history date (or six days before `today` when the
/// history is empty) and is padded to whole weeks, at least one week.
pub fn heat_map_dates(habit: &Habit, today: NaiveDate) -> Vec<NaiveDate> {
    let (start, total_days) = match habit.history.first() {
        Some(first) => (*first, (today - *first).num_days() + 1),
        None => (today - Duration::days(WEEK_DAYS - 1), WEEK_DAYS),
    };
    let weeks = (total_days.max(1) + WEEK_DAYS - 1) / WEEK_DAYS;
    let cells = (weeks * WEEK_DAYS).max(WEEK_DAYS);
    (0..cells)
        .map(|offset| start + Duration::days(offset))
        .collect()
}

/// Total number of completed days for a habit.
pub fn completion_total(habit: &Habit) -> usize {
    habit.history.len()
}

#[cfg(test)]
mod tests {
    use super::{heat_map_dates, last_seven_days};
    use crate::model::habit::Habit;
    use chrono::{Duration, NaiveDate};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 20).unwrap()
    }

    #[test]
    fn seven_day_series_counts_habits_per_day() {
        let a = Habit::with_id("a", "Walk")
            .unwrap()
            .with_toggled_date(today())
            .with_toggled_date(today() - Duration::days(6));
        let b = Habit::with_id("b", "Read")
            .unwrap()
            .with_toggled_date(today())
            .with_toggled_date(today() - Duration::days(7));

        let series = last_seven_days(&[a, b], today());
        assert_eq!(series.len(), 7);
        assert_eq!(series[0].date, today() - Duration::days(6));
        assert_eq!(series[0].count, 1);
        assert_eq!(series[6].date, today());
        assert_eq!(series[6].count, 2);
        assert_eq!(series[3].count, 0);
    }

    #[test]
    fn heat_map_defaults_to_last_week_for_empty_history() {
        let habit = Habit::with_id("a", "Walk").unwrap();
        let cells = heat_map_dates(&habit, today());
        assert_eq!(cells.len(), 7);
        assert_eq!(cells[0], today() - Duration::days(6));
        assert_eq!(cells[6], today());
    }

    #[test]
    fn heat_map_pads_history_span_to_whole_weeks() {
        let habit = Habit::with_id("a", "Walk")
            .unwrap()
            .with_toggled_date(today() - Duration::days(9));
        let cells = heat_map_dates(&habit, today());
        assert_eq!(cells.len(), 14);
        assert_eq!(cells[0], today() - Duration::days(9));
    }
}
