//! Remote sync: per-user document subscription and merge-write push.
//!
//! # Responsibility
//! - Define the remote document store contract (`RemoteStore`).
//! - Mirror canonical state to `users/{account_id}` while a session is active.
//! - Normalize incoming documents into canonical shapes.
//!
//! # Invariants
//! - Pushes always carry the full latest snapshot (last writer wins).
//! - Remote failures are logged and never roll back local state.

pub mod channel;
pub mod error;
pub mod remote_store;

pub use channel::{PushStatus, RemoteState, RemoteSyncChannel};
pub use error::{SyncError, SyncResult, SyncStage};
pub use remote_store::{
    InMemoryRemoteStore, RemoteEvent, RemoteStore, RemoteSubscription, SubscriptionId,
};
