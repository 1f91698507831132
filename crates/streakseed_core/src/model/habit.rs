//! Habit domain model.
//!
//! # Responsibility
//! - Define the canonical habit record tracked by the controller.
//! - Provide pure, copy-on-write helpers for every habit mutation.
//!
//! # Invariants
//! - `id` is generated once on creation and never changes.
//! - `name` is non-empty after trimming.
//! - `history` holds calendar dates only; membership is toggle-idempotent.
//! - `badges` only contains ids from the badge catalogue and never shrinks.
//!
//! # See also
//! - `crate::model::record` for the lenient wire shape.

use crate::model::badge::is_known_badge;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque habit identifier, generated client-side.
pub type HabitId = String;

/// Badge identifier from `crate::model::badge::BADGES`.
pub type BadgeId = String;

/// Canonical on-disk and on-wire format of history dates.
pub const HISTORY_DATE_FORMAT: &str = "%Y-%m-%d";

/// Validation failures for habit input and habit lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HabitValidationError {
    EmptyId,
    EmptyName,
    InvalidDate(String),
    UnknownBadge(String),
    DuplicateId(HabitId),
}

impl Display for HabitValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "habit id cannot be empty"),
            Self::EmptyName => write!(f, "habit name cannot be empty"),
            Self::InvalidDate(value) => {
                write!(f, "invalid history date `{value}`; expected YYYY-MM-DD")
            }
            Self::UnknownBadge(value) => write!(f, "unknown badge id `{value}`"),
            Self::DuplicateId(value) => write!(f, "duplicate habit id `{value}`"),
        }
    }
}

impl Error for HabitValidationError {}

/// User input for creating a habit (single add or bulk import).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHabit {
    pub name: String,
}

impl NewHabit {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// One tracked habit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub id: HabitId,
    pub name: String,
    /// Days marked complete, serialized as sorted `YYYY-MM-DD` strings.
    pub history: BTreeSet<NaiveDate>,
    pub paused: bool,
    /// Unlocked badge ids.
    pub badges: BTreeSet<BadgeId>,
}

impl Habit {
    /// Creates a habit with a freshly generated id and empty progress.
    ///
    /// The name is trimmed; an empty result is rejected.
    pub fn new(name: &str) -> Result<Self, HabitValidationError> {
        Self::with_id(Uuid::new_v4().to_string(), name)
    }

    /// Creates a habit with a caller-provided id.
    ///
    /// Used by normalization paths where identity already exists remotely.
    pub fn with_id(id: impl Into<HabitId>, name: &str) -> Result<Self, HabitValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(HabitValidationError::EmptyId);
        }
        let name = normalize_name(name)?;
        Ok(Self {
            id,
            name,
            history: BTreeSet::new(),
            paused: false,
            badges: BTreeSet::new(),
        })
    }

    /// Validates field-level invariants.
    pub fn validate(&self) -> Result<(), HabitValidationError> {
        if self.id.trim().is_empty() {
            return Err(HabitValidationError::EmptyId);
        }
        if self.name.trim().is_empty() {
            return Err(HabitValidationError::EmptyName);
        }
        if let Some(unknown) = self.badges.iter().find(|badge| !is_known_badge(badge)) {
            return Err(HabitValidationError::UnknownBadge(unknown.clone()));
        }
        Ok(())
    }

    pub fn is_done_on(&self, date: NaiveDate) -> bool {
        self.history.contains(&date)
    }

    /// Returns a copy with `date` flipped: present dates are removed,
    /// absent dates are added.
    pub fn with_toggled_date(&self, date: NaiveDate) -> Self {
        let mut next = self.clone();
        if !next.history.remove(&date) {
            next.history.insert(date);
        }
        next
    }

    pub fn with_paused(&self, paused: bool) -> Self {
        Self {
            paused,
            ..self.clone()
        }
    }

    /// Returns a copy with `badge_id` added to the unlocked set.
    pub fn with_badge(&self, badge_id: &str) -> Self {
        let mut next = self.clone();
        next.badges.insert(badge_id.to_string());
        next
    }
}

/// Parses a strict `YYYY-MM-DD` history date.
pub fn parse_history_date(value: &str) -> Result<NaiveDate, HabitValidationError> {
    let trimmed = value.trim();
    if trimmed.len() != 10 {
        return Err(HabitValidationError::InvalidDate(value.to_string()));
    }
    NaiveDate::parse_from_str(trimmed, HISTORY_DATE_FORMAT)
        .map_err(|_| HabitValidationError::InvalidDate(value.to_string()))
}

/// Formats a date the way it is stored in `history`.
pub fn format_history_date(date: NaiveDate) -> String {
    date.format(HISTORY_DATE_FORMAT).to_string()
}

/// Checks list-level invariants: every habit valid, ids unique.
pub fn validate_habit_list(habits: &[Habit]) -> Result<(), HabitValidationError> {
    let mut seen = HashSet::with_capacity(habits.len());
    for habit in habits {
        habit.validate()?;
        if !seen.insert(habit.id.as_str()) {
            return Err(HabitValidationError::DuplicateId(habit.id.clone()));
        }
    }
    Ok(())
}

fn normalize_name(name: &str) -> Result<String, HabitValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(HabitValidationError::EmptyName);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::{
        format_history_date, parse_history_date, validate_habit_list, Habit,
        HabitValidationError,
    };
    use chrono::NaiveDate;

    fn date(value: &str) -> NaiveDate {
        parse_history_date(value).expect("valid test date")
    }

    #[test]
    fn new_habit_starts_empty_and_trims_name() {
        let habit = Habit::new("  Meditate ").expect("valid habit");
        assert_eq!(habit.name, "Meditate");
        assert!(!habit.id.is_empty());
        assert!(habit.history.is_empty());
        assert!(habit.badges.is_empty());
        assert!(!habit.paused);
    }

    #[test]
    fn blank_name_is_rejected() {
        assert_eq!(Habit::new("   "), Err(HabitValidationError::EmptyName));
    }

    #[test]
    fn toggling_twice_restores_history() {
        let habit = Habit::new("Read").expect("valid habit");
        let day = date("2025-03-01");

        let marked = habit.with_toggled_date(day);
        assert!(marked.is_done_on(day));
        assert!(!habit.is_done_on(day), "original value must not be aliased");

        let unmarked = marked.with_toggled_date(day);
        assert_eq!(unmarked.history, habit.history);
    }

    #[test]
    fn parse_history_date_requires_canonical_form() {
        assert!(parse_history_date("2025-02-30").is_err());
        assert!(parse_history_date("2025-2-3").is_err());
        assert!(parse_history_date("yesterday").is_err());
        assert_eq!(format_history_date(date("2025-02-03")), "2025-02-03");
    }

    #[test]
    fn list_validation_rejects_duplicate_ids_and_unknown_badges() {
        let first = Habit::with_id("h1", "Walk").expect("valid habit");
        let second = Habit::with_id("h1", "Run").expect("valid habit");
        assert_eq!(
            validate_habit_list(&[first.clone(), second]),
            Err(HabitValidationError::DuplicateId("h1".to_string()))
        );

        let badged = first.with_badge("mystery");
        assert_eq!(
            validate_habit_list(&[badged]),
            Err(HabitValidationError::UnknownBadge("mystery".to_string()))
        );
    }

    #[test]
    fn serializes_history_as_sorted_date_strings() {
        let habit = Habit::with_id("h1", "Walk")
            .expect("valid habit")
            .with_toggled_date(date("2025-01-03"))
            .with_toggled_date(date("2025-01-01"));

        let json = serde_json::to_value(&habit).expect("serialize habit");
        assert_eq!(json["history"], serde_json::json!(["2025-01-01", "2025-01-03"]));
        assert_eq!(json["paused"], serde_json::json!(false));
        assert_eq!(json["badges"], serde_json::json!([]));
    }
}
