mod common;

use chrono::{Duration, TimeZone, Utc};
use common::Harness;
use serde_json::json;
use std::sync::Arc;
use streakseed_core::{AddHabitOutcome, InMemoryRemoteStore, NewHabit, ReminderHandle, UserSession};

fn with_reminder(h: &mut Harness, habit_id: &str, hour: u32) {
    let mut settings = h.controller.settings().clone();
    settings.daily_reminder.enabled = true;
    settings.daily_reminder.hour = hour;
    settings.daily_reminder.minute = 0;
    settings.daily_reminder.habit_name = "Walk".to_string();
    settings.daily_reminder.habit_id = Some(habit_id.to_string());
    h.controller.update_settings(settings).unwrap();
}

fn add_walk(h: &mut Harness) -> String {
    match h.controller.add_habit(NewHabit::new("Walk")).unwrap() {
        AddHabitOutcome::Added(id) => id,
        AddHabitOutcome::SignInRequired => panic!("first habit is never gated"),
    }
}

#[test]
fn enabling_the_reminder_schedules_the_next_slot() {
    let mut h = Harness::new();
    assert!(h.notifications.scheduled().is_empty());
    let id = add_walk(&mut h);
    with_reminder(&mut h, &id, 9);

    let scheduled = h.notifications.scheduled();
    assert_eq!(scheduled.len(), 1);
    let request = &scheduled[0].1;
    assert_eq!(request.title, "StreakSeed Reminder");
    assert_eq!(request.body, "Time to work on \"Walk\"!");
    // 09:00 today already passed at 12:00 UTC.
    assert_eq!(
        request.scheduled_for,
        Utc.with_ymd_and_hms(2025, 3, 11, 9, 0, 0).unwrap()
    );
    assert_eq!(
        h.controller.pending_reminder().unwrap().habit_id.as_deref(),
        Some(id.as_str())
    );
}

#[test]
fn unrelated_mutations_keep_the_pending_reminder() {
    let mut h = Harness::new();
    let id = add_walk(&mut h);
    with_reminder(&mut h, &id, 18);

    h.controller.toggle_dark_mode();
    h.controller.toggle_today(&id).unwrap();
    assert_eq!(h.notifications.scheduled().len(), 1);
    assert!(h.notifications.cancelled().is_empty());
}

#[test]
fn pausing_the_target_habit_cancels_and_resuming_reschedules() {
    let mut h = Harness::new();
    let id = add_walk(&mut h);
    with_reminder(&mut h, &id, 18);

    h.controller.toggle_pause(&id).unwrap();
    assert_eq!(h.notifications.cancelled(), vec![ReminderHandle(1)]);
    assert!(h.controller.pending_reminder().is_none());

    h.controller.toggle_pause(&id).unwrap();
    assert_eq!(h.notifications.scheduled().len(), 2);
    assert_eq!(
        h.controller.pending_reminder().unwrap().fire_at,
        Utc.with_ymd_and_hms(2025, 3, 10, 18, 0, 0).unwrap()
    );
}

#[test]
fn changing_time_or_timezone_reschedules() {
    let mut h = Harness::new();
    let id = add_walk(&mut h);
    with_reminder(&mut h, &id, 18);

    let mut settings = h.controller.settings().clone();
    settings.timezone = "Asia/Tokyo".to_string();
    h.controller.update_settings(settings).unwrap();

    assert_eq!(h.notifications.cancelled(), vec![ReminderHandle(1)]);
    // 18:00 JST == 09:00 UTC, already passed at 12:00 UTC.
    assert_eq!(
        h.controller.pending_reminder().unwrap().fire_at,
        Utc.with_ymd_and_hms(2025, 3, 11, 9, 0, 0).unwrap()
    );
}

#[test]
fn refresh_after_the_reminder_fired_moves_to_the_next_day() {
    let mut h = Harness::new();
    let id = add_walk(&mut h);
    with_reminder(&mut h, &id, 18);

    h.clock.advance(Duration::hours(7));
    h.controller.refresh_reminder();
    assert_eq!(
        h.controller.pending_reminder().unwrap().fire_at,
        Utc.with_ymd_and_hms(2025, 3, 11, 18, 0, 0).unwrap()
    );
    assert_eq!(h.notifications.scheduled().len(), 2);
}

#[test]
fn disabling_the_reminder_cancels_it() {
    let mut h = Harness::new();
    let id = add_walk(&mut h);
    with_reminder(&mut h, &id, 18);

    let mut settings = h.controller.settings().clone();
    settings.daily_reminder.enabled = false;
    h.controller.update_settings(settings).unwrap();
    assert!(h.controller.pending_reminder().is_none());
    assert_eq!(h.notifications.cancelled().len(), 1);
}

#[test]
fn remote_rename_follows_the_pinned_habit_id() {
    let remote = Arc::new(InMemoryRemoteStore::new());
    let mut h = Harness::with_remote(remote.clone());
    let id = add_walk(&mut h);
    with_reminder(&mut h, &id, 18);
    h.controller
        .handle_session_change(Some(UserSession::new("u1")));
    h.controller.process_remote_updates();

    let mut document = remote.document("u1").unwrap();
    document["habits"][0]["name"] = json!("Evening walk");
    remote.put_document("u1", document);
    h.controller.process_remote_updates();

    let plan = h.controller.pending_reminder().unwrap();
    assert_eq!(plan.habit_name, "Evening walk");
    assert_eq!(
        h.notifications.scheduled().last().unwrap().1.body,
        "Time to work on \"Evening walk\"!"
    );
}
