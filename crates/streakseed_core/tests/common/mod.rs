#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use streakseed_core::{
    AuthProvider, FixedClock, HabitController, InMemoryRemoteStore, MemoryKeyValueStore,
    NotificationRequest, NotificationSink, ReminderHandle, RemoteStore, Settings,
    TelemetryPayload, TelemetrySink,
};

#[derive(Default)]
pub struct RecordingAuth {
    logins: AtomicUsize,
    logouts: AtomicUsize,
}

impl RecordingAuth {
    pub fn logins(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }

    pub fn logouts(&self) -> usize {
        self.logouts.load(Ordering::SeqCst)
    }
}

impl AuthProvider for RecordingAuth {
    fn login(&self) {
        self.logins.fetch_add(1, Ordering::SeqCst);
    }

    fn logout(&self) {
        self.logouts.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct RecordingTelemetry {
    events: Mutex<Vec<(String, TelemetryPayload)>>,
}

impl RecordingTelemetry {
    pub fn names(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn last(&self, name: &str) -> Option<TelemetryPayload> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(event, _)| event == name)
            .map(|(_, payload)| payload.clone())
    }

    pub fn count(&self, name: &str) -> usize {
        self.names().iter().filter(|event| *event == name).count()
    }
}

impl TelemetrySink for RecordingTelemetry {
    fn log_event(&self, name: &str, payload: &TelemetryPayload) {
        self.events
            .lock()
            .unwrap()
            .push((name.to_string(), payload.clone()));
    }
}

#[derive(Default)]
pub struct RecordingNotifications {
    next_handle: AtomicU64,
    scheduled: Mutex<Vec<(ReminderHandle, NotificationRequest)>>,
    cancelled: Mutex<Vec<ReminderHandle>>,
}

impl RecordingNotifications {
    pub fn scheduled(&self) -> Vec<(ReminderHandle, NotificationRequest)> {
        self.scheduled.lock().unwrap().clone()
    }

    pub fn cancelled(&self) -> Vec<ReminderHandle> {
        self.cancelled.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingNotifications {
    fn schedule(&self, request: NotificationRequest) -> ReminderHandle {
        let handle = ReminderHandle(self.next_handle.fetch_add(1, Ordering::SeqCst) + 1);
        self.scheduled.lock().unwrap().push((handle, request));
        handle
    }

    fn cancel(&self, handle: ReminderHandle) {
        self.cancelled.lock().unwrap().push(handle);
    }
}

/// 2025-03-10 12:00 UTC.
pub fn start_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap(),
    ))
}

pub struct Harness {
    pub controller: HabitController<MemoryKeyValueStore>,
    pub backend: MemoryKeyValueStore,
    pub remote: Arc<InMemoryRemoteStore>,
    pub auth: Arc<RecordingAuth>,
    pub telemetry: Arc<RecordingTelemetry>,
    pub notifications: Arc<RecordingNotifications>,
    pub clock: Arc<FixedClock>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_backend(MemoryKeyValueStore::new())
    }

    pub fn with_backend(backend: MemoryKeyValueStore) -> Self {
        Self::build(backend, Arc::new(InMemoryRemoteStore::new()), Settings::default())
    }

    pub fn with_remote(remote: Arc<InMemoryRemoteStore>) -> Self {
        Self::build(MemoryKeyValueStore::new(), remote, Settings::default())
    }

    pub fn build(
        backend: MemoryKeyValueStore,
        remote: Arc<InMemoryRemoteStore>,
        default_settings: Settings,
    ) -> Self {
        let auth = Arc::new(RecordingAuth::default());
        let telemetry = Arc::new(RecordingTelemetry::default());
        let notifications = Arc::new(RecordingNotifications::default());
        let clock = start_clock();
        let controller = HabitController::builder(backend.clone())
            .with_remote_store(remote.clone() as Arc<dyn RemoteStore>)
            .with_auth(auth.clone())
            .with_telemetry(telemetry.clone())
            .with_notifications(notifications.clone())
            .with_clock(clock.clone())
            .with_default_settings(default_settings)
            .build();
        Self {
            controller,
            backend,
            remote,
            auth,
            telemetry,
            notifications,
            clock,
        }
    }
}
