//! User settings model.
//!
//! # Responsibility
//! - Define display preferences, active timezone and the daily reminder slot.
//! - Resolve "today" for the active timezone.
//!
//! # Invariants
//! - `daily_reminder.hour` is in `0..=23`, `daily_reminder.minute` in `0..=59`.
//! - `timezone` is an IANA identifier known to `chrono-tz`.
//! - Settings are never deleted; first run starts from `Settings::default()`.

use crate::model::habit::HabitId;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use log::warn;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const DEFAULT_TIMEZONE: &str = "UTC";
pub const DEFAULT_REMINDER_HOUR: u32 = 9;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsValidationError {
    UnknownTimezone(String),
    ReminderHourOutOfRange(u32),
    ReminderMinuteOutOfRange(u32),
}

impl Display for SettingsValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownTimezone(value) => write!(f, "unknown IANA timezone `{value}`"),
            Self::ReminderHourOutOfRange(value) => {
                write!(f, "reminder hour {value} is out of range 0..=23")
            }
            Self::ReminderMinuteOutOfRange(value) => {
                write!(f, "reminder minute {value} is out of range 0..=59")
            }
        }
    }
}

impl Error for SettingsValidationError {}

/// Single daily reminder slot.
///
/// `habit_name` is what older clients wrote; `habit_id` pins the reminder to a
/// habit so renames and duplicate names stay unambiguous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReminder {
    pub enabled: bool,
    pub hour: u32,
    pub minute: u32,
    pub habit_name: String,
    #[serde(default)]
    pub habit_id: Option<HabitId>,
}

impl Default for DailyReminder {
    fn default() -> Self {
        Self {
            enabled: false,
            hour: DEFAULT_REMINDER_HOUR,
            minute: 0,
            habit_name: String::new(),
            habit_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub dark_mode: bool,
    pub show_heat_map: bool,
    pub timezone: String,
    pub daily_reminder: DailyReminder,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dark_mode: false,
            show_heat_map: true,
            timezone: DEFAULT_TIMEZONE.to_string(),
            daily_reminder: DailyReminder::default(),
        }
    }
}

impl Settings {
    /// Default settings pinned to a specific timezone.
    pub fn with_timezone(timezone: impl Into<String>) -> Self {
        Self {
            timezone: timezone.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), SettingsValidationError> {
        parse_timezone(&self.timezone)?;
        if self.daily_reminder.hour > 23 {
            return Err(SettingsValidationError::ReminderHourOutOfRange(
                self.daily_reminder.hour,
            ));
        }
        if self.daily_reminder.minute > 59 {
            return Err(SettingsValidationError::ReminderMinuteOutOfRange(
                self.daily_reminder.minute,
            ));
        }
        Ok(())
    }

    /// Active timezone; unknown identifiers fall back to UTC.
    pub fn resolved_timezone(&self) -> Tz {
        match parse_timezone(&self.timezone) {
            Ok(tz) => tz,
            Err(_) => {
                warn!(
                    "event=timezone_resolve module=settings status=fallback fallback={}",
                    DEFAULT_TIMEZONE
                );
                Tz::UTC
            }
        }
    }

    /// Calendar date of `now` in the active timezone.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.resolved_timezone()).date_naive()
    }
}

/// Parses an IANA timezone identifier.
pub fn parse_timezone(value: &str) -> Result<Tz, SettingsValidationError> {
    value
        .trim()
        .parse::<Tz>()
        .map_err(|_| SettingsValidationError::UnknownTimezone(value.to_string()))
}
