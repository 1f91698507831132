//! Remote document store contract and in-memory reference implementation.
//!
//! # Invariants
//! - `subscribe` delivers the current document (or `None`) immediately, then
//!   every subsequent change for that account.
//! - `merge_write` merges objects recursively and replaces arrays/scalars;
//!   fields absent from the write are preserved.

use super::error::{SyncError, SyncResult, SyncStage};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, MutexGuard};

pub type SubscriptionId = u64;

/// Notification delivered on a live subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteEvent {
    /// Full document; `None` when the document does not exist.
    Snapshot(Option<Value>),
    Failed(SyncError),
}

/// Live subscription handle. Events are queued until drained.
#[derive(Debug)]
pub struct RemoteSubscription {
    pub id: SubscriptionId,
    pub events: Receiver<RemoteEvent>,
}

/// Document-oriented store addressed by `users/{account_id}`.
pub trait RemoteStore: Send + Sync {
    fn provider_id(&self) -> &str;
    fn subscribe(&self, account_id: &str) -> SyncResult<RemoteSubscription>;
    fn unsubscribe(&self, subscription_id: SubscriptionId);
    fn merge_write(&self, account_id: &str, fields: Map<String, Value>) -> SyncResult<()>;
}

const MEMORY_PROVIDER_ID: &str = "memory";

struct Subscriber {
    account_id: String,
    sender: Sender<RemoteEvent>,
}

#[derive(Default)]
struct MemoryState {
    documents: BTreeMap<String, Value>,
    subscribers: BTreeMap<SubscriptionId, Subscriber>,
    next_subscription_id: SubscriptionId,
    offline: bool,
    write_count: usize,
}

/// Process-local remote store with document-database semantics.
///
/// Shared between devices in tests by wrapping it in an `Arc`.
#[derive(Default)]
pub struct InMemoryRemoteStore {
    state: Mutex<MemoryState>,
}

impl InMemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline, subscribe and write calls fail with a retryable error.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    pub fn document(&self, account_id: &str) -> Option<Value> {
        self.lock().documents.get(account_id).cloned()
    }

    /// Replaces a whole document, as another client or an admin tool would.
    pub fn put_document(&self, account_id: &str, document: Value) {
        let mut state = self.lock();
        state.documents.insert(account_id.to_string(), document);
        notify(&mut state, account_id);
    }

    /// Sends a failure to every subscriber of `account_id`.
    pub fn broadcast_failure(&self, account_id: &str, error: SyncError) {
        let mut state = self.lock();
        state.subscribers.retain(|_, subscriber| {
            subscriber.account_id != account_id
                || subscriber
                    .sender
                    .send(RemoteEvent::Failed(error.clone()))
                    .is_ok()
        });
    }

    /// Number of successful merge writes across all accounts.
    pub fn write_count(&self) -> usize {
        self.lock().write_count
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn offline_error(stage: SyncStage) -> SyncError {
        SyncError::new(
            MEMORY_PROVIDER_ID,
            stage,
            "offline",
            "remote store is unreachable",
            true,
        )
    }
}

impl RemoteStore for InMemoryRemoteStore {
    fn provider_id(&self) -> &str {
        MEMORY_PROVIDER_ID
    }

    fn subscribe(&self, account_id: &str) -> SyncResult<RemoteSubscription> {
        let mut state = self.lock();
        if state.offline {
            return Err(Self::offline_error(SyncStage::Subscribe));
        }

        let (sender, events) = mpsc::channel();
        let current = state.documents.get(account_id).cloned();
        // The receiver is alive at this point, so the send cannot fail.
        let _ = sender.send(RemoteEvent::Snapshot(current));

        state.next_subscription_id += 1;
        let id = state.next_subscription_id;
        state.subscribers.insert(
            id,
            Subscriber {
                account_id: account_id.to_string(),
                sender,
            },
        );
        Ok(RemoteSubscription { id, events })
    }

    fn unsubscribe(&self, subscription_id: SubscriptionId) {
        self.lock().subscribers.remove(&subscription_id);
    }

    fn merge_write(&self, account_id: &str, fields: Map<String, Value>) -> SyncResult<()> {
        let mut state = self.lock();
        if state.offline {
            return Err(Self::offline_error(SyncStage::Push));
        }

        let document = state
            .documents
            .entry(account_id.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        merge_value(document, Value::Object(fields));
        state.write_count += 1;
        notify(&mut state, account_id);
        Ok(())
    }
}

/// Recursively merges `patch` into `target`: objects merge key by key, any
/// other value replaces the target wholesale.
pub fn merge_value(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target_map), Value::Object(patch_map)) => {
            for (key, value) in patch_map {
                match target_map.get_mut(&key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        target_map.insert(key, value);
                    }
                }
            }
        }
        (target, patch) => *target = patch,
    }
}

fn notify(state: &mut MemoryState, account_id: &str) {
    let snapshot = state.documents.get(account_id).cloned();
    state.subscribers.retain(|_, subscriber| {
        subscriber.account_id != account_id
            || subscriber
                .sender
                .send(RemoteEvent::Snapshot(snapshot.clone()))
                .is_ok()
    });
}

#[cfg(test)]
mod tests {
    use super::{merge_value, InMemoryRemoteStore, RemoteEvent, RemoteStore};
    use serde_json::{json, Map, Value};

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn merge_preserves_unrelated_fields_and_replaces_arrays() {
        let mut document = json!({
            "habits": [{ "id": "old" }],
            "settings": { "darkMode": false, "timezone": "UTC" },
            "profile": { "plan": "pro" }
        });
        merge_value(
            &mut document,
            json!({ "habits": [], "settings": { "darkMode": true } }),
        );

        assert_eq!(document["habits"], json!([]));
        assert_eq!(document["settings"]["darkMode"], json!(true));
        assert_eq!(document["settings"]["timezone"], json!("UTC"));
        assert_eq!(document["profile"]["plan"], json!("pro"));
    }

    #[test]
    fn subscribe_delivers_missing_document_then_changes() {
        let store = InMemoryRemoteStore::new();
        let subscription = store.subscribe("u1").expect("subscribe");
        assert_eq!(
            subscription.events.try_recv().expect("initial event"),
            RemoteEvent::Snapshot(None)
        );

        store
            .merge_write("u1", fields(json!({ "habits": [] })))
            .expect("write");
        assert_eq!(
            subscription.events.try_recv().expect("change event"),
            RemoteEvent::Snapshot(Some(json!({ "habits": [] })))
        );
    }

    #[test]
    fn offline_store_rejects_writes_with_retryable_error() {
        let store = InMemoryRemoteStore::new();
        store.set_offline(true);
        let err = store
            .merge_write("u1", Map::new())
            .expect_err("offline write must fail");
        assert!(err.retryable);
        assert_eq!(err.code, "offline");
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn unsubscribed_listeners_stop_receiving() {
        let store = InMemoryRemoteStore::new();
        let subscription = store.subscribe("u1").expect("subscribe");
        store.unsubscribe(subscription.id);
        assert_eq!(store.subscriber_count(), 0);

        store
            .merge_write("u1", fields(json!({ "habits": [] })))
            .expect("write");
        // Only the initial snapshot was queued before unsubscribing.
        assert!(subscription.events.try_recv().is_ok());
        assert!(subscription.events.try_recv().is_err());
    }
}
