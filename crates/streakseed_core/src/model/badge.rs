//! Achievement badge catalogue.
//!
//! # Responsibility
//! - Define the static, immutable set of streak badges.
//! - Provide lookups used by validation and badge evaluation.
//!
//! # Invariants
//! - `BADGES` is ordered by ascending `required_consecutive_days`.
//! - Badge ids are unique and never renamed once shipped, because unlocked
//!   ids are persisted on habits.

use serde::Serialize;

/// Static description of one unlockable badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeDefinition {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    /// Consecutive completed days (ending today) required to earn the badge.
    pub required_consecutive_days: u32,
    /// Emoji rendered by the UI.
    pub icon: &'static str,
}

pub const BADGES: &[BadgeDefinition] = &[
    BadgeDefinition {
        id: "day1",
        label: "First Day!",
        description: "Complete your first day",
        required_consecutive_days: 1,
        icon: "🎉",
    },
    BadgeDefinition {
        id: "week1",
        label: "Weekly Warrior",
        description: "7 days in a row",
        required_consecutive_days: 7,
        icon: "🏅",
    },
    BadgeDefinition {
        id: "month1",
        label: "Monthly Master",
        description: "30 days in a row",
        required_consecutive_days: 30,
        icon: "🥇",
    },
    BadgeDefinition {
        id: "year1",
        label: "Yearly Champion",
        description: "365 days in a row",
        required_consecutive_days: 365,
        icon: "🏆",
    },
];

/// Returns the definition for `id`, if it is part of the catalogue.
pub fn badge_definition(id: &str) -> Option<&'static BadgeDefinition> {
    BADGES.iter().find(|badge| badge.id == id)
}

pub fn is_known_badge(id: &str) -> bool {
    badge_definition(id).is_some()
}
