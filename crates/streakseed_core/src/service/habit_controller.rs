//! Habit state controller.
//!
//! # Responsibility
//! - Own canonical habits and settings and expose every mutation on them.
//! - Be the only writer of the local store and the remote sync channel.
//! - Enforce the free-tier habit limit for signed-out users.
//! - Keep the daily reminder in step with canonical state.
//!
//! # Invariants
//! - Canonical state is the remote copy while a remote subscription is
//!   active, otherwise the local copy. The two are never blended at read time.
//! - Every mutation validates first, then persists locally, then pushes the
//!   full snapshot when a subscription is active, then emits telemetry.
//! - A rejected mutation leaves all state untouched.
//! - Collaborator failures (remote, storage, telemetry) never fail a mutation.
//!
//! # See also
//! - `crate::sync::channel` for the remote protocol.

use crate::collab::auth::{AuthProvider, NoopAuth, UserSession};
use crate::collab::clock::{Clock, SystemClock};
use crate::collab::notifications::NotificationSink;
use crate::collab::telemetry::{NoopTelemetry, TelemetryPayload, TelemetrySink};
use crate::model::badge::is_known_badge;
use crate::model::habit::{
    format_history_date, parse_history_date, Habit, HabitId, HabitValidationError, NewHabit,
};
use crate::model::record::{decode_habit_records, normalize_habits, SettingsRecord};
use crate::model::settings::{Settings, SettingsValidationError};
use crate::progress::badges::{evaluate_badges, BadgeUnlock};
use crate::progress::streak::current_streak;
use crate::service::reminder::{plan_daily_reminder, ReminderPlan, ReminderScheduler};
use crate::store::{KeyValueStore, Loaded, LocalStore, HABITS_KEY, SETTINGS_KEY};
use crate::sync::{RemoteState, RemoteStore, RemoteSyncChannel};
use chrono::{DateTime, NaiveDate, Utc};
use log::{error, info, warn};
use serde::Serialize;
use serde_json::{json, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Habits a signed-out user may hold.
pub const FREE_TIER_HABIT_LIMIT: usize = 1;

/// Controller error for rejected mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    /// Input failed habit validation.
    Validation(HabitValidationError),
    /// Settings failed validation.
    InvalidSettings(SettingsValidationError),
    /// No canonical habit has this id.
    HabitNotFound(HabitId),
}

impl Display for ControllerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidSettings(err) => write!(f, "{err}"),
            Self::HabitNotFound(id) => write!(f, "habit not found: {id}"),
        }
    }
}

impl Error for ControllerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::InvalidSettings(err) => Some(err),
            Self::HabitNotFound(_) => None,
        }
    }
}

impl From<HabitValidationError> for ControllerError {
    fn from(value: HabitValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<SettingsValidationError> for ControllerError {
    fn from(value: SettingsValidationError) -> Self {
        Self::InvalidSettings(value)
    }
}

pub type ControllerResult<T> = Result<T, ControllerError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddHabitOutcome {
    Added(HabitId),
    /// Free-tier limit reached; sign-in was prompted and nothing changed.
    SignInRequired,
}

/// Result of a history toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    /// Whether the date is marked complete after the toggle.
    pub completed: bool,
    /// Badges unlocked by the resulting streak.
    pub unlocked: Vec<BadgeUnlock>,
}

/// Wires optional collaborators before the controller loads state.
pub struct HabitControllerBuilder<S: KeyValueStore> {
    backend: S,
    remote_store: Option<Arc<dyn RemoteStore>>,
    auth: Arc<dyn AuthProvider>,
    telemetry: Arc<dyn TelemetrySink>,
    notifications: Option<Arc<dyn NotificationSink>>,
    clock: Arc<dyn Clock>,
    default_settings: Settings,
}

impl<S: KeyValueStore> HabitControllerBuilder<S> {
    pub fn new(backend: S) -> Self {
        Self {
            backend,
            remote_store: None,
            auth: Arc::new(NoopAuth),
            telemetry: Arc::new(NoopTelemetry),
            notifications: None,
            clock: Arc::new(SystemClock),
            default_settings: Settings::default(),
        }
    }

    pub fn with_remote_store(mut self, remote_store: Arc<dyn RemoteStore>) -> Self {
        self.remote_store = Some(remote_store);
        self
    }

    pub fn with_auth(mut self, auth: Arc<dyn AuthProvider>) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn with_notifications(mut self, notifications: Arc<dyn NotificationSink>) -> Self {
        self.notifications = Some(notifications);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// First-run settings, also the fallback for missing stored fields.
    /// Hosts usually pin the device timezone here.
    pub fn with_default_settings(mut self, settings: Settings) -> Self {
        self.default_settings = settings;
        self
    }

    /// Loads persisted state and returns a signed-out controller.
    pub fn build(self) -> HabitController<S> {
        let store = LocalStore::new(self.backend);
        let (local_habits, habits_readable) = match store.read::<Vec<Value>>(HABITS_KEY) {
            Loaded::Value(values) => (normalize_habits(decode_habit_records(values)), true),
            Loaded::Missing => (Vec::new(), true),
            Loaded::Unreadable => (Vec::new(), false),
        };
        let (local_settings, settings_readable) =
            match store.read::<Option<SettingsRecord>>(SETTINGS_KEY) {
                Loaded::Value(Some(record)) => (record.normalize(&self.default_settings), true),
                Loaded::Value(None) | Loaded::Missing => (self.default_settings.clone(), true),
                Loaded::Unreadable => (self.default_settings.clone(), false),
            };
        info!(
            "event=controller_load module=service status=ok habit_count={}",
            local_habits.len()
        );

        let mut controller = HabitController {
            store,
            local_habits,
            local_settings,
            session: None,
            channel: self.remote_store.map(RemoteSyncChannel::new),
            remote: None,
            auth: self.auth,
            telemetry: self.telemetry,
            clock: self.clock,
            reminders: ReminderScheduler::new(self.notifications),
        };
        // Rewrites normalized values so later reads see canonical shapes.
        // Unreadable values stay on disk until a mutation replaces them.
        if habits_readable {
            controller.persist(HABITS_KEY, &controller.local_habits);
        } else {
            warn!("event=controller_load module=service status=kept_unreadable key={HABITS_KEY}");
        }
        if settings_readable {
            controller.persist(SETTINGS_KEY, &controller.local_settings);
        } else {
            warn!("event=controller_load module=service status=kept_unreadable key={SETTINGS_KEY}");
        }
        controller.refresh_reminder();
        controller
    }
}

/// Single owner of canonical habit state.
pub struct HabitController<S: KeyValueStore> {
    store: LocalStore<S>,
    local_habits: Vec<Habit>,
    local_settings: Settings,
    session: Option<UserSession>,
    channel: Option<RemoteSyncChannel>,
    /// Remote-derived canonical copy; `Some` only while subscribed.
    remote: Option<RemoteState>,
    auth: Arc<dyn AuthProvider>,
    telemetry: Arc<dyn TelemetrySink>,
    clock: Arc<dyn Clock>,
    reminders: ReminderScheduler,
}

impl<S: KeyValueStore> HabitController<S> {
    pub fn builder(backend: S) -> HabitControllerBuilder<S> {
        HabitControllerBuilder::new(backend)
    }

    /// Canonical habits.
    pub fn habits(&self) -> &[Habit] {
        match &self.remote {
            Some(remote) => &remote.habits,
            None => &self.local_habits,
        }
    }

    /// Canonical settings.
    pub fn settings(&self) -> &Settings {
        match &self.remote {
            Some(remote) => &remote.settings,
            None => &self.local_settings,
        }
    }

    pub fn habit(&self, habit_id: &str) -> Option<&Habit> {
        self.habits().iter().find(|habit| habit.id == habit_id)
    }

    pub fn local_habits(&self) -> &[Habit] {
        &self.local_habits
    }

    pub fn local_settings(&self) -> &Settings {
        &self.local_settings
    }

    pub fn session(&self) -> Option<&UserSession> {
        self.session.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Whether canonical state currently comes from the remote subscription.
    pub fn is_syncing(&self) -> bool {
        self.remote.is_some()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Today in the canonical settings timezone.
    pub fn today(&self) -> NaiveDate {
        self.settings().today(self.clock.now())
    }

    pub fn current_streak(&self, habit_id: &str) -> ControllerResult<u32> {
        let habit = self.find(habit_id)?;
        Ok(current_streak(&habit.history, self.today()))
    }

    pub fn pending_reminder(&self) -> Option<&ReminderPlan> {
        self.reminders.pending()
    }

    /// Appends one habit, or prompts sign-in when the free tier is full.
    pub fn add_habit(&mut self, input: NewHabit) -> ControllerResult<AddHabitOutcome> {
        let habit = Habit::new(&input.name)?;

        if !self.is_authenticated() && self.local_habits.len() >= FREE_TIER_HABIT_LIMIT {
            info!(
                "event=habit_add module=service status=gated habit_count={}",
                self.local_habits.len()
            );
            self.auth.login();
            self.emit("prompt_login_for_extra_habit", json!({}));
            return Ok(AddHabitOutcome::SignInRequired);
        }

        let habit_id = habit.id.clone();
        let mut habits = self.habits().to_vec();
        habits.push(habit);
        self.commit_habits(habits);
        self.emit("add_habit", json!({ "id": habit_id }));
        Ok(AddHabitOutcome::Added(habit_id))
    }

    pub fn remove_habit(&mut self, habit_id: &str) -> ControllerResult<()> {
        self.find(habit_id)?;
        let habits = self
            .habits()
            .iter()
            .filter(|habit| habit.id != habit_id)
            .cloned()
            .collect();
        self.commit_habits(habits);
        self.emit("remove_habit", json!({ "id": habit_id }));
        Ok(())
    }

    /// Flips completion of `date`, then unlocks any badges the new streak
    /// earns.
    pub fn toggle_date(
        &mut self,
        habit_id: &str,
        date: NaiveDate,
    ) -> ControllerResult<ToggleOutcome> {
        let toggled = self.find(habit_id)?.with_toggled_date(date);
        let completed = toggled.is_done_on(date);
        self.replace_habit(toggled);
        self.emit(
            "toggle_day",
            json!({ "id": habit_id, "date": format_history_date(date) }),
        );

        let unlocked = self.refresh_badges(habit_id)?;
        Ok(ToggleOutcome {
            completed,
            unlocked,
        })
    }

    /// `toggle_date` with a `YYYY-MM-DD` date string.
    pub fn toggle_date_str(&mut self, habit_id: &str, date: &str) -> ControllerResult<ToggleOutcome> {
        let date = parse_history_date(date)?;
        self.toggle_date(habit_id, date)
    }

    pub fn toggle_today(&mut self, habit_id: &str) -> ControllerResult<ToggleOutcome> {
        let today = self.today();
        self.toggle_date(habit_id, today)
    }

    /// Flips the paused flag and returns the new value.
    pub fn toggle_pause(&mut self, habit_id: &str) -> ControllerResult<bool> {
        let current = self.find(habit_id)?;
        let paused = !current.paused;
        let updated = current.with_paused(paused);
        self.replace_habit(updated);
        self.emit("toggle_pause", json!({ "id": habit_id, "paused": paused }));
        Ok(paused)
    }

    /// Adds `badge_id` to the habit. Returns `false` when it was already
    /// unlocked, in which case nothing is written.
    pub fn unlock_badge(&mut self, habit_id: &str, badge_id: &str) -> ControllerResult<bool> {
        if !is_known_badge(badge_id) {
            return Err(HabitValidationError::UnknownBadge(badge_id.to_string()).into());
        }
        let current = self.find(habit_id)?;
        if current.badges.contains(badge_id) {
            return Ok(false);
        }
        let updated = current.with_badge(badge_id);
        self.replace_habit(updated);
        self.emit(
            "unlock_badge",
            json!({ "habitId": habit_id, "badgeId": badge_id }),
        );
        Ok(true)
    }

    /// Evaluates the badge catalogue for one habit and unlocks every newly
    /// earned badge.
    pub fn refresh_badges(&mut self, habit_id: &str) -> ControllerResult<Vec<BadgeUnlock>> {
        let today = self.today();
        let unlocks = evaluate_badges(self.find(habit_id)?, today);
        for unlock in &unlocks {
            self.unlock_badge(&unlock.habit_id, &unlock.badge_id)?;
        }
        if !unlocks.is_empty() {
            info!(
                "event=badge_unlock module=service status=ok habit_id={} count={}",
                habit_id,
                unlocks.len()
            );
        }
        Ok(unlocks)
    }

    /// Replaces the whole habit list with fresh habits built from `inputs`.
    ///
    /// An empty selection is a cancel and changes nothing. Returns the number
    /// of imported habits.
    pub fn import_habits(&mut self, inputs: Vec<NewHabit>) -> ControllerResult<usize> {
        if inputs.is_empty() {
            info!("event=habit_import module=service status=skipped reason=empty_selection");
            return Ok(0);
        }
        let habits = inputs
            .iter()
            .map(|input| Habit::new(&input.name))
            .collect::<Result<Vec<_>, _>>()?;

        let count = habits.len();
        self.commit_habits(habits);
        self.emit("import_habits", json!({ "count": count }));
        Ok(count)
    }

    pub fn update_settings(&mut self, settings: Settings) -> ControllerResult<()> {
        settings.validate()?;
        let payload = json!({
            "darkMode": settings.dark_mode,
            "showHeatMap": settings.show_heat_map,
            "timezone": settings.timezone,
            "reminderEnabled": settings.daily_reminder.enabled,
        });
        self.commit_settings(settings);
        self.emit("update_settings", payload);
        Ok(())
    }

    /// Flips dark mode and returns the new value.
    pub fn toggle_dark_mode(&mut self) -> bool {
        let mut settings = self.settings().clone();
        settings.dark_mode = !settings.dark_mode;
        let dark_mode = settings.dark_mode;
        self.commit_settings(settings);
        self.emit("toggle_dark_mode", json!({ "darkMode": dark_mode }));
        dark_mode
    }

    /// Starts interactive sign-in; the session arrives later through
    /// `handle_session_change`.
    pub fn prompt_sign_in(&mut self) {
        self.auth.login();
        self.emit("prompt_login_for_more_habits", json!({}));
    }

    /// Signs out and drops back to local-only state immediately.
    pub fn sign_out(&mut self) {
        self.auth.logout();
        self.emit("sign_out", json!({}));
        self.handle_session_change(None);
    }

    /// Applies a session change reported by the auth provider.
    ///
    /// Sign-in opens the remote subscription and pushes the local snapshot.
    /// Sign-out cancels it; canonical state reverts to the local copy.
    pub fn handle_session_change(&mut self, session: Option<UserSession>) {
        match session {
            Some(session) => self.start_remote(session),
            None => self.stop_remote(),
        }
        self.refresh_reminder();
    }

    /// Applies queued remote snapshots. Returns how many were applied.
    pub fn process_remote_updates(&mut self) -> usize {
        if self.remote.is_none() {
            return 0;
        }
        let Some(channel) = self.channel.as_mut() else {
            return 0;
        };
        let states = channel.drain();
        let applied = states.len();
        if let Some(latest) = states.into_iter().last() {
            info!(
                "event=remote_apply module=service status=ok snapshots={} habit_count={}",
                applied,
                latest.habits.len()
            );
            self.remote = Some(latest);
            self.refresh_reminder();
        }
        applied
    }

    /// Recomputes the reminder plan against canonical state and "now".
    pub fn refresh_reminder(&mut self) {
        let plan = plan_daily_reminder(self.settings(), self.habits(), self.clock.now());
        self.reminders.apply(plan);
    }

    fn start_remote(&mut self, session: UserSession) {
        if self.session.as_ref() == Some(&session) && self.remote.is_some() {
            return;
        }
        if self
            .session
            .as_ref()
            .is_some_and(|current| current.account_id != session.account_id)
        {
            self.stop_remote();
        }

        info!(
            "event=session_change module=service status=signed_in account_id={}",
            session.account_id
        );
        let Some(channel) = self.channel.as_mut() else {
            info!("event=remote_connect module=service status=skipped reason=no_remote_store");
            self.session = Some(session);
            return;
        };

        match channel.connect(&session, &self.local_settings) {
            Ok(()) => {
                channel.push(&self.local_habits, &self.local_settings);
                self.remote = Some(RemoteState {
                    habits: self.local_habits.clone(),
                    settings: self.local_settings.clone(),
                });
            }
            Err(err) => warn!(
                "event=remote_connect module=service status=error code={} retryable={} fallback=local_only",
                err.code, err.retryable
            ),
        }
        self.session = Some(session);
    }

    fn stop_remote(&mut self) {
        if let Some(channel) = self.channel.as_mut() {
            channel.disconnect();
        }
        self.remote = None;
        if self.session.take().is_some() {
            info!("event=session_change module=service status=signed_out");
        }
    }

    fn find(&self, habit_id: &str) -> ControllerResult<&Habit> {
        self.habit(habit_id)
            .ok_or_else(|| ControllerError::HabitNotFound(habit_id.to_string()))
    }

    fn replace_habit(&mut self, updated: Habit) {
        let habits = self
            .habits()
            .iter()
            .map(|habit| {
                if habit.id == updated.id {
                    updated.clone()
                } else {
                    habit.clone()
                }
            })
            .collect();
        self.commit_habits(habits);
    }

    fn commit_habits(&mut self, habits: Vec<Habit>) {
        self.persist(HABITS_KEY, &habits);
        if let Some(remote) = self.remote.as_mut() {
            remote.habits = habits.clone();
        }
        self.local_habits = habits;
        self.push_canonical();
        self.refresh_reminder();
    }

    fn commit_settings(&mut self, settings: Settings) {
        self.persist(SETTINGS_KEY, &settings);
        if let Some(remote) = self.remote.as_mut() {
            remote.settings = settings.clone();
        }
        self.local_settings = settings;
        self.push_canonical();
        self.refresh_reminder();
    }

    fn push_canonical(&mut self) {
        if let (Some(channel), Some(remote)) = (self.channel.as_mut(), self.remote.as_ref()) {
            channel.push(&remote.habits, &remote.settings);
        }
    }

    fn persist<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        if let Err(err) = self.store.save(key, value) {
            error!(
                "event=store_save module=service status=error key={} error={}",
                key, err
            );
        }
    }

    fn emit(&self, name: &str, payload: Value) {
        let payload = match payload {
            Value::Object(map) => map,
            _ => TelemetryPayload::new(),
        };
        self.telemetry.log_event(name, &payload);
    }
}

#[cfg(test)]
mod tests {
    use super::{AddHabitOutcome, ControllerError, HabitController};
    use crate::collab::clock::FixedClock;
    use crate::model::habit::NewHabit;
    use crate::model::settings::Settings;
    use crate::store::MemoryKeyValueStore;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn controller() -> HabitController<MemoryKeyValueStore> {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap());
        HabitController::builder(MemoryKeyValueStore::new())
            .with_clock(Arc::new(clock))
            .build()
    }

    #[test]
    fn empty_name_is_rejected_before_gating() {
        let mut controller = controller();
        let err = controller
            .add_habit(NewHabit::new("   "))
            .expect_err("empty names are invalid");
        assert!(matches!(err, ControllerError::Validation(_)));
        assert!(controller.habits().is_empty());
    }

    #[test]
    fn unknown_habit_ids_are_reported() {
        let mut controller = controller();
        assert_eq!(
            controller.toggle_pause("missing"),
            Err(ControllerError::HabitNotFound("missing".to_string()))
        );
    }

    #[test]
    fn invalid_settings_are_not_applied() {
        let mut controller = controller();
        let err = controller
            .update_settings(Settings::with_timezone("Not/AZone"))
            .expect_err("unknown timezone");
        assert!(matches!(err, ControllerError::InvalidSettings(_)));
        assert_eq!(controller.settings(), &Settings::default());
    }

    #[test]
    fn toggle_today_uses_settings_timezone() {
        let mut controller = controller();
        let AddHabitOutcome::Added(id) = controller
            .add_habit(NewHabit::new("Walk"))
            .expect("add succeeds")
        else {
            panic!("first habit is never gated");
        };
        let mut settings = controller.settings().clone();
        settings.timezone = "Pacific/Kiritimati".to_string();
        controller.update_settings(settings).expect("valid settings");

        controller.toggle_today(&id).expect("toggle");
        let habit = controller.habit(&id).expect("habit exists");
        // 12:00 UTC is already the next day at UTC+14.
        assert!(habit
            .history
            .contains(&chrono::NaiveDate::from_ymd_opt(2025, 3, 11).unwrap()));
    }
}
