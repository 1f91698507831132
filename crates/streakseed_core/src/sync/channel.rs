//! Per-user remote sync channel.
//!
//! # Responsibility
//! - Hold at most one live subscription to `users/{account_id}`.
//! - Push full `{ habits, settings }` snapshots with merge writes.
//! - Normalize received documents into `RemoteState`.
//!
//! # Invariants
//! - After `disconnect`, `push` is a no-op and no events are drained.
//! - A missing document is created on first access with an empty habit list
//!   and the baseline settings.
//! - Push failures are logged and reported as `PushStatus::Failed`, never
//!   propagated as errors.

use super::error::{SyncError, SyncResult, SyncStage};
use super::remote_store::{RemoteEvent, RemoteStore, RemoteSubscription};
use crate::collab::auth::UserSession;
use crate::model::habit::Habit;
use crate::model::record::{decode_habit_records, lenient, normalize_habits, SettingsRecord};
use crate::model::settings::Settings;
use log::{error, info, warn};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::mpsc::TryRecvError;
use std::sync::Arc;

const HABITS_FIELD: &str = "habits";
const SETTINGS_FIELD: &str = "settings";

/// Remote document as it may arrive from any client version.
#[derive(Debug, Default, Deserialize)]
struct RemoteDocument {
    #[serde(default, deserialize_with = "lenient")]
    habits: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "lenient")]
    settings: Option<SettingsRecord>,
}

/// Normalized remote copy of canonical state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteState {
    pub habits: Vec<Habit>,
    pub settings: Settings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushStatus {
    Sent,
    /// No active session; nothing was written.
    Skipped,
    Failed,
}

struct ActiveSubscription {
    account_id: String,
    subscription: RemoteSubscription,
    /// Fallback for settings fields missing from received documents.
    baseline: Settings,
    /// Set once this subscription wrote the document; later `None`
    /// snapshots are stale.
    document_written: bool,
}

pub struct RemoteSyncChannel {
    store: Arc<dyn RemoteStore>,
    active: Option<ActiveSubscription>,
}

impl RemoteSyncChannel {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            active: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn account_id(&self) -> Option<&str> {
        self.active
            .as_ref()
            .map(|active| active.account_id.as_str())
    }

    /// Opens the live subscription for `session`.
    ///
    /// Reconnecting to the same account is a no-op; a different account
    /// replaces the current subscription.
    pub fn connect(&mut self, session: &UserSession, baseline: &Settings) -> SyncResult<()> {
        if self.account_id() == Some(session.account_id.as_str()) {
            return Ok(());
        }
        self.disconnect();

        let subscription = self.store.subscribe(&session.account_id).map_err(|err| {
            error!(
                "event=remote_subscribe module=sync status=error provider={} code={} retryable={}",
                err.provider, err.code, err.retryable
            );
            err
        })?;
        info!(
            "event=remote_subscribe module=sync status=ok provider={} subscription_id={}",
            self.store.provider_id(),
            subscription.id
        );

        self.active = Some(ActiveSubscription {
            account_id: session.account_id.clone(),
            subscription,
            baseline: baseline.clone(),
            document_written: false,
        });
        Ok(())
    }

    /// Cancels the subscription; later pushes are skipped.
    pub fn disconnect(&mut self) {
        if let Some(active) = self.active.take() {
            self.store.unsubscribe(active.subscription.id);
            info!(
                "event=remote_unsubscribe module=sync status=ok provider={} subscription_id={}",
                self.store.provider_id(),
                active.subscription.id
            );
        }
    }

    /// Merge-writes the full snapshot to the active account document.
    pub fn push(&mut self, habits: &[Habit], settings: &Settings) -> PushStatus {
        let Some(active) = self.active.as_mut() else {
            return PushStatus::Skipped;
        };

        let result = snapshot_fields(self.store.provider_id(), habits, settings)
            .and_then(|fields| self.store.merge_write(&active.account_id, fields));
        match result {
            Ok(()) => {
                active.document_written = true;
                info!(
                    "event=remote_push module=sync status=ok provider={} habit_count={}",
                    self.store.provider_id(),
                    habits.len()
                );
                PushStatus::Sent
            }
            Err(err) => {
                error!(
                    "event=remote_push module=sync status=error provider={} code={} retryable={} error={}",
                    err.provider, err.code, err.retryable, err.message
                );
                PushStatus::Failed
            }
        }
    }

    /// Drains queued subscription events into normalized states, oldest first.
    pub fn drain(&mut self) -> Vec<RemoteState> {
        let mut states = Vec::new();
        let Some(active) = self.active.as_mut() else {
            return states;
        };

        loop {
            let event = match active.subscription.events.try_recv() {
                Ok(event) => event,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!(
                        "event=remote_receive module=sync status=error provider={} code=stream_closed",
                        self.store.provider_id()
                    );
                    break;
                }
            };

            match event {
                RemoteEvent::Snapshot(None) if active.document_written => {
                    info!(
                        "event=remote_receive module=sync status=skipped provider={} reason=stale_missing_document",
                        self.store.provider_id()
                    );
                }
                RemoteEvent::Snapshot(None) => {
                    let state = RemoteState {
                        habits: Vec::new(),
                        settings: active.baseline.clone(),
                    };
                    info!(
                        "event=remote_document_create module=sync status=start provider={}",
                        self.store.provider_id()
                    );
                    let created = snapshot_fields(self.store.provider_id(), &[], &state.settings)
                        .and_then(|fields| self.store.merge_write(&active.account_id, fields));
                    match created {
                        Ok(()) => active.document_written = true,
                        Err(err) => error!(
                            "event=remote_document_create module=sync status=error provider={} code={}",
                            err.provider, err.code
                        ),
                    }
                    states.push(state);
                }
                RemoteEvent::Snapshot(Some(document)) => {
                    match decode_document(document, &active.baseline) {
                        Ok(state) => {
                            active.baseline = state.settings.clone();
                            states.push(state);
                        }
                        Err(err) => warn!(
                            "event=remote_receive module=sync status=error provider={} code=malformed_document error={}",
                            self.store.provider_id(),
                            err
                        ),
                    }
                }
                RemoteEvent::Failed(err) => warn!(
                    "event=remote_receive module=sync status=error provider={} stage={} code={}",
                    err.provider,
                    err.stage.as_str(),
                    err.code
                ),
            }
        }
        states
    }
}

impl Drop for RemoteSyncChannel {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn decode_document(document: Value, baseline: &Settings) -> serde_json::Result<RemoteState> {
    let document: RemoteDocument = serde_json::from_value(document)?;
    let habits = normalize_habits(decode_habit_records(document.habits.unwrap_or_default()));
    let settings = match document.settings {
        Some(record) => record.normalize(baseline),
        None => baseline.clone(),
    };
    Ok(RemoteState { habits, settings })
}

fn snapshot_fields(
    provider: &str,
    habits: &[Habit],
    settings: &Settings,
) -> SyncResult<Map<String, Value>> {
    let encode_error = |err: serde_json::Error| {
        SyncError::new(
            provider,
            SyncStage::Push,
            "encode_failed",
            err.to_string(),
            false,
        )
    };
    let mut fields = Map::new();
    fields.insert(
        HABITS_FIELD.to_string(),
        serde_json::to_value(habits).map_err(encode_error)?,
    );
    fields.insert(
        SETTINGS_FIELD.to_string(),
        serde_json::to_value(settings).map_err(encode_error)?,
    );
    Ok(fields)
}
