//! Core state and sync engine for StreakSeed.
//! This crate is the single source of truth for habit invariants.

pub mod collab;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod progress;
pub mod service;
pub mod store;
pub mod sync;
pub mod templates;

pub use collab::auth::{AuthProvider, NoopAuth, UserSession};
pub use collab::clock::{Clock, FixedClock, SystemClock};
pub use collab::notifications::{
    LogNotificationSink, NotificationRequest, NotificationSink, ReminderHandle,
};
pub use collab::telemetry::{LogTelemetry, NoopTelemetry, TelemetryPayload, TelemetrySink};
pub use config::CoreConfig;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::badge::{badge_definition, BadgeDefinition, BADGES};
pub use model::habit::{BadgeId, Habit, HabitId, HabitValidationError, NewHabit};
pub use model::settings::{DailyReminder, Settings, SettingsValidationError};
pub use progress::badges::{evaluate_badges, BadgeUnlock};
pub use progress::stats::{completion_total, heat_map_dates, last_seven_days, DayCount};
pub use progress::streak::{current_streak, longest_streak};
pub use service::habit_controller::{
    AddHabitOutcome, ControllerError, ControllerResult, HabitController, HabitControllerBuilder,
    ToggleOutcome, FREE_TIER_HABIT_LIMIT,
};
pub use service::reminder::{plan_daily_reminder, ReminderPlan, ReminderScheduler};
pub use store::{
    KeyValueStore, Loaded, LocalStore, MemoryKeyValueStore, SqliteKeyValueStore, StoreError,
    StoreResult,
};
pub use sync::{InMemoryRemoteStore, RemoteStore, RemoteSyncChannel, SyncError, SyncResult};
pub use templates::{StarterTemplate, STARTER_TEMPLATES};

