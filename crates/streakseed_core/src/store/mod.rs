//! Local persistent store.
//!
//! # Responsibility
//! - Define the string-keyed, string-valued durable store contract.
//! - Provide a typed JSON facade (`LocalStore`) with fail-safe reads.
//!
//! # Invariants
//! - `LocalStore::read` and `LocalStore::load` never fail: absent or corrupt
//!   values yield `Loaded::Missing`/`Loaded::Unreadable` or the
//!   caller-supplied default.
//! - Exactly two logical keys are used by the controller: `HABITS_KEY` and
//!   `SETTINGS_KEY`.

mod local;
mod memory;
mod sqlite;

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use local::{Loaded, LocalStore};
pub use memory::MemoryKeyValueStore;
pub use sqlite::SqliteKeyValueStore;

/// Storage key holding the JSON array of habits.
pub const HABITS_KEY: &str = "habits";
/// Storage key holding the JSON settings object.
pub const SETTINGS_KEY: &str = "settings";

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    Backend(DbError),
    Encode(serde_json::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Backend(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode stored value: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Backend(err) => Some(err),
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Backend(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Backend(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Durable string key/value storage available synchronously.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
}
