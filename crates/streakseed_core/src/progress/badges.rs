//! Badge evaluation.
//!
//! # Invariants
//! - Evaluation never removes a badge; it only reports ids to add.
//! - Every crossed threshold fires, not just the highest one.
//! - Re-evaluating with the post-unlock badge set yields no events.

use crate::model::badge::{BadgeDefinition, BADGES};
use crate::model::habit::{BadgeId, Habit, HabitId};
use crate::progress::streak::current_streak;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

/// "Habit earned badge" event handed to the UI for celebration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeUnlock {
    pub habit_id: HabitId,
    pub badge_id: BadgeId,
}

/// Evaluates the built-in catalogue for one habit.
pub fn evaluate_badges(habit: &Habit, today: NaiveDate) -> Vec<BadgeUnlock> {
    let streak = current_streak(&habit.history, today);
    newly_earned(BADGES, streak, &habit.badges)
        .map(|badge| BadgeUnlock {
            habit_id: habit.id.clone(),
            badge_id: badge.id.to_string(),
        })
        .collect()
}

/// Definitions whose threshold is met by `streak` and not yet unlocked.
pub fn newly_earned<'a>(
    definitions: &'a [BadgeDefinition],
    streak: u32,
    unlocked: &'a BTreeSet<BadgeId>,
) -> impl Iterator<Item = &'a BadgeDefinition> + 'a {
    definitions.iter().filter(move |badge| {
        badge.required_consecutive_days <= streak && !unlocked.contains(badge.id)
    })
}
