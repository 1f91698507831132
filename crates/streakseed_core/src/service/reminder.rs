//! Daily reminder planning and scheduling.
//!
//! # Responsibility
//! - Compute the next reminder instant from settings, habits and "now".
//! - Keep at most one pending notification and replace it when the plan
//!   changes.
//!
//! # Invariants
//! - Reminders for paused habits are never scheduled.
//! - The planned instant is strictly after `now`.

use crate::collab::notifications::{NotificationRequest, NotificationSink, ReminderHandle};
use crate::model::habit::{Habit, HabitId};
use crate::model::settings::{DailyReminder, Settings};
use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use log::info;
use std::sync::Arc;

pub const REMINDER_TITLE: &str = "StreakSeed Reminder";

/// DST gaps are at most a couple of hours; probe forward in 15 minute steps.
const GAP_PROBE_STEP_MINUTES: i64 = 15;
const GAP_PROBE_STEPS: i64 = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderPlan {
    pub fire_at: DateTime<Utc>,
    /// Habit the reminder resolved to, when it resolved to one.
    pub habit_id: Option<HabitId>,
    pub habit_name: String,
}

impl ReminderPlan {
    pub fn to_request(&self) -> NotificationRequest {
        NotificationRequest {
            title: REMINDER_TITLE.to_string(),
            body: format!("Time to work on \"{}\"!", self.habit_name),
            scheduled_for: self.fire_at,
        }
    }
}

/// Plans the next daily reminder, or `None` when nothing should fire.
///
/// The target habit is looked up by `habit_id` first, then by exact name.
/// An unresolved reminder still fires with the stored name.
pub fn plan_daily_reminder(
    settings: &Settings,
    habits: &[Habit],
    now: DateTime<Utc>,
) -> Option<ReminderPlan> {
    let reminder = &settings.daily_reminder;
    if !reminder.enabled {
        return None;
    }

    let (habit_id, habit_name) = match resolve_target(reminder, habits) {
        Some(habit) if habit.paused => return None,
        Some(habit) => (Some(habit.id.clone()), habit.name.clone()),
        None => (None, reminder.habit_name.clone()),
    };

    let fire_at = next_occurrence(
        settings.resolved_timezone(),
        reminder.hour,
        reminder.minute,
        now,
    )?;
    Some(ReminderPlan {
        fire_at,
        habit_id,
        habit_name,
    })
}

/// Next instant strictly after `now` whose wall-clock time in `tz` is
/// `hour:minute`.
pub fn next_occurrence(
    tz: Tz,
    hour: u32,
    minute: u32,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    let local_today = now.with_timezone(&tz).date_naive();
    (0..=2)
        .filter_map(|offset| local_today.checked_add_signed(Duration::days(offset)))
        .filter_map(|date| resolve_local(tz, date.and_time(time)))
        .find(|candidate| *candidate > now)
}

fn resolve_target<'a>(reminder: &DailyReminder, habits: &'a [Habit]) -> Option<&'a Habit> {
    if let Some(id) = &reminder.habit_id {
        if let Some(habit) = habits.iter().find(|habit| &habit.id == id) {
            return Some(habit);
        }
    }
    if reminder.habit_name.trim().is_empty() {
        return None;
    }
    habits.iter().find(|habit| habit.name == reminder.habit_name)
}

fn resolve_local(tz: Tz, local: NaiveDateTime) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(at) => Some(at.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => (1..=GAP_PROBE_STEPS)
            .map(|step| local + Duration::minutes(step * GAP_PROBE_STEP_MINUTES))
            .find_map(|probe| tz.from_local_datetime(&probe).earliest())
            .map(|at| at.with_timezone(&Utc)),
    }
}

/// Owns the single pending reminder notification.
pub struct ReminderScheduler {
    sink: Option<Arc<dyn NotificationSink>>,
    pending: Option<(ReminderPlan, ReminderHandle)>,
}

impl ReminderScheduler {
    pub fn new(sink: Option<Arc<dyn NotificationSink>>) -> Self {
        Self {
            sink,
            pending: None,
        }
    }

    pub fn pending(&self) -> Option<&ReminderPlan> {
        self.pending.as_ref().map(|(plan, _)| plan)
    }

    /// Makes `plan` the pending reminder; unchanged plans are left alone.
    pub fn apply(&mut self, plan: Option<ReminderPlan>) {
        if self.pending() == plan.as_ref() {
            return;
        }
        let Some(sink) = &self.sink else {
            return;
        };

        if let Some((_, handle)) = self.pending.take() {
            sink.cancel(handle);
        }
        if let Some(plan) = plan {
            let handle = sink.schedule(plan.to_request());
            info!(
                "event=reminder_plan module=service status=scheduled handle={} fire_at={}",
                handle.0,
                plan.fire_at.to_rfc3339()
            );
            self.pending = Some((plan, handle));
        } else {
            info!("event=reminder_plan module=service status=cleared");
        }
    }
}
