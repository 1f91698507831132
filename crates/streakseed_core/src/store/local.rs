//! Typed JSON facade over a `KeyValueStore`.

use super::{KeyValueStore, StoreResult};
use log::{error, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Outcome of a typed read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Loaded<T> {
    Value(T),
    Missing,
    /// Present but undecodable, or the backend failed. The stored bytes are
    /// left alone.
    Unreadable,
}

pub struct LocalStore<S: KeyValueStore> {
    backend: S,
}

impl<S: KeyValueStore> LocalStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Reads and decodes `key`, telling an absent value apart from one that
    /// could not be read or decoded.
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Loaded<T> {
        let raw = match self.backend.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Loaded::Missing,
            Err(err) => {
                error!(
                    "event=store_load module=store status=fallback key={} reason=backend error={}",
                    key, err
                );
                return Loaded::Unreadable;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Loaded::Value(value),
            Err(err) => {
                warn!(
                    "event=store_load module=store status=fallback key={} reason=malformed line={} column={}",
                    key,
                    err.line(),
                    err.column()
                );
                Loaded::Unreadable
            }
        }
    }

    /// Loads and decodes `key`, returning `default` when the value is absent,
    /// malformed, or the backend fails.
    pub fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.read(key) {
            Loaded::Value(value) => value,
            Loaded::Missing | Loaded::Unreadable => default,
        }
    }

    /// Encodes and writes `value` under `key`.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StoreResult<()> {
        let encoded = serde_json::to_string(value)?;
        self.backend.set(key, &encoded)
    }
}
