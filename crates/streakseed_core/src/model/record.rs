//! Lenient wire records and normalization into canonical models.
//!
//! # Responsibility
//! - Describe stored/remote data as it may actually look: every field optional.
//! - Normalize records into `Habit` / `Settings` before they reach app logic.
//!
//! # Invariants
//! - Normalized habits satisfy `validate_habit_list`.
//! - Missing settings fields inherit from a caller-supplied baseline, field by
//!   field, never from `Settings::default()` implicitly.
//! - A mistyped field decodes as absent; a mistyped record is dropped alone.

use crate::model::badge::is_known_badge;
use crate::model::habit::{parse_history_date, Habit};
use crate::model::settings::{parse_timezone, DailyReminder, Settings};
use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Habit as written by any client version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub history: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub paused: Option<bool>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub badges: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub enabled: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub hour: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub minute: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub habit_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub habit_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub dark_mode: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub show_heat_map: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub timezone: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub daily_reminder: Option<ReminderRecord>,
}

/// Decodes any JSON value, yielding `None` when it does not fit `T`.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Keeps a list even when some entries are not strings. Those entries are
/// carried as their JSON text so they fail validation and get counted.
fn lenient_strings<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(None);
    };
    Ok(Some(
        items
            .into_iter()
            .map(|item| match item {
                Value::String(text) => text,
                other => other.to_string(),
            })
            .collect(),
    ))
}

/// Decodes raw list entries one at a time, dropping only those that are not
/// habit objects.
pub fn decode_habit_records(values: Vec<Value>) -> Vec<HabitRecord> {
    let mut records = Vec::with_capacity(values.len());
    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<HabitRecord>(value) {
            Ok(record) => records.push(record),
            Err(err) => warn!(
                "event=record_decode module=model status=dropped index={} error={}",
                index, err
            ),
        }
    }
    records
}

impl HabitRecord {
    /// Converts into a canonical habit, or `None` when identity is missing.
    ///
    /// Malformed dates and unknown badge ids are dropped individually.
    pub fn normalize(self) -> Option<Habit> {
        let id = self.id.filter(|value| !value.trim().is_empty());
        let Some(id) = id else {
            warn!("event=record_normalize module=model status=dropped reason=missing_id");
            return None;
        };
        let name = self.name.unwrap_or_default();
        let mut habit = match Habit::with_id(id.clone(), &name) {
            Ok(habit) => habit,
            Err(err) => {
                warn!(
                    "event=record_normalize module=model status=dropped habit_id={} reason={}",
                    id, err
                );
                return None;
            }
        };

        let mut invalid_dates = 0usize;
        for raw in self.history.unwrap_or_default() {
            match parse_history_date(&raw) {
                Ok(date) => {
                    habit.history.insert(date);
                }
                Err(_) => invalid_dates += 1,
            }
        }

        let mut unknown_badges = 0usize;
        for badge in self.badges.unwrap_or_default() {
            if is_known_badge(&badge) {
                habit.badges.insert(badge);
            } else {
                unknown_badges += 1;
            }
        }

        if invalid_dates > 0 || unknown_badges > 0 {
            warn!(
                "event=record_normalize module=model status=partial habit_id={} invalid_dates={} unknown_badges={}",
                habit.id, invalid_dates, unknown_badges
            );
        }

        habit.paused = self.paused.unwrap_or(false);
        Some(habit)
    }
}

/// Normalizes a record list, keeping the first occurrence of each id.
pub fn normalize_habits(records: Vec<HabitRecord>) -> Vec<Habit> {
    let mut seen = HashSet::new();
    let mut habits = Vec::with_capacity(records.len());
    for habit in records.into_iter().filter_map(HabitRecord::normalize) {
        if seen.insert(habit.id.clone()) {
            habits.push(habit);
        } else {
            warn!(
                "event=record_normalize module=model status=dropped habit_id={} reason=duplicate_id",
                habit.id
            );
        }
    }
    habits
}

impl SettingsRecord {
    /// Fills every missing or out-of-range field from `baseline`.
    pub fn normalize(self, baseline: &Settings) -> Settings {
        let timezone = self
            .timezone
            .filter(|value| parse_timezone(value).is_ok())
            .unwrap_or_else(|| baseline.timezone.clone());
        let daily_reminder = match self.daily_reminder {
            Some(record) => record.normalize(&baseline.daily_reminder),
            None => baseline.daily_reminder.clone(),
        };

        Settings {
            dark_mode: self.dark_mode.unwrap_or(baseline.dark_mode),
            show_heat_map: self.show_heat_map.unwrap_or(baseline.show_heat_map),
            timezone,
            daily_reminder,
        }
    }
}

impl ReminderRecord {
    fn normalize(self, baseline: &DailyReminder) -> DailyReminder {
        DailyReminder {
            enabled: self.enabled.unwrap_or(baseline.enabled),
            hour: self
                .hour
                .filter(|hour| *hour <= 23)
                .unwrap_or(baseline.hour),
            minute: self
                .minute
                .filter(|minute| *minute <= 59)
                .unwrap_or(baseline.minute),
            habit_name: self
                .habit_name
                .unwrap_or_else(|| baseline.habit_name.clone()),
            // Only explicit non-empty ids pin the reminder; older clients never
            // send the field.
            habit_id: self.habit_id.filter(|value| !value.trim().is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_habit_records, normalize_habits, HabitRecord, SettingsRecord};
    use crate::model::settings::Settings;
    use serde_json::{json, Value};

    #[test]
    fn fills_missing_optional_habit_fields() {
        let records: Vec<HabitRecord> =
            serde_json::from_value(json!([{ "id": "a", "name": "Stretch" }]))
                .expect("records decode");
        let habits = normalize_habits(records);

        assert_eq!(habits.len(), 1);
        assert!(habits[0].history.is_empty());
        assert!(!habits[0].paused);
        assert!(habits[0].badges.is_empty());
    }

    #[test]
    fn drops_records_without_identity_and_duplicate_ids() {
        let records: Vec<HabitRecord> = serde_json::from_value(json!([
            { "name": "No id" },
            { "id": "b", "name": "   " },
            { "id": "c", "name": "Journal", "paused": true },
            { "id": "c", "name": "Journal again" }
        ]))
        .expect("records decode");
        let habits = normalize_habits(records);

        assert_eq!(habits.len(), 1);
        assert_eq!(habits[0].name, "Journal");
        assert!(habits[0].paused);
    }

    #[test]
    fn drops_bad_dates_and_unknown_badges_individually() {
        let records: Vec<HabitRecord> = serde_json::from_value(json!([{
            "id": "a",
            "name": "Walk",
            "history": ["2025-01-01", "not-a-date", "2025-01-02"],
            "badges": ["day1", "legendary"]
        }]))
        .expect("records decode");
        let habits = normalize_habits(records);

        assert_eq!(habits[0].history.len(), 2);
        assert_eq!(habits[0].badges.len(), 1);
        assert!(habits[0].badges.contains("day1"));
    }

    #[test]
    fn partial_settings_inherit_from_baseline() {
        let mut baseline = Settings::with_timezone("Europe/Paris");
        baseline.daily_reminder.habit_name = "Read".to_string();
        let record: SettingsRecord = serde_json::from_value(json!({
            "darkMode": true,
            "timezone": "Nowhere/Special",
            "dailyReminder": { "enabled": true, "hour": 31 }
        }))
        .expect("settings decode");

        let settings = record.normalize(&baseline);
        assert!(settings.dark_mode);
        assert!(settings.show_heat_map);
        assert_eq!(settings.timezone, "Europe/Paris");
        assert!(settings.daily_reminder.enabled);
        assert_eq!(settings.daily_reminder.hour, 9);
        assert_eq!(settings.daily_reminder.habit_name, "Read");
    }

    #[test]
    fn mistyped_fields_decode_as_absent() {
        let values = json!([
            { "id": "a", "name": "Walk", "paused": "no", "history": ["2025-01-01", 20250102] },
            { "id": 7, "name": "Numeric id" },
            "not an object",
            { "id": "b", "name": 5 }
        ]);
        let Value::Array(values) = values else {
            unreachable!()
        };
        let records = decode_habit_records(values);
        assert_eq!(records.len(), 3);

        let habits = normalize_habits(records);
        assert_eq!(habits.len(), 1);
        assert_eq!(habits[0].id, "a");
        assert!(!habits[0].paused);
        assert_eq!(habits[0].history.len(), 1);
    }

    #[test]
    fn mistyped_settings_fields_inherit_from_baseline() {
        let record: SettingsRecord = serde_json::from_value(json!({
            "darkMode": "yes",
            "showHeatMap": false,
            "dailyReminder": { "enabled": true, "hour": "nine", "minute": 15 }
        }))
        .expect("settings decode");

        let settings = record.normalize(&Settings::default());
        assert!(!settings.dark_mode);
        assert!(!settings.show_heat_map);
        assert!(settings.daily_reminder.enabled);
        assert_eq!(settings.daily_reminder.hour, 9);
        assert_eq!(settings.daily_reminder.minute, 15);
    }
}
