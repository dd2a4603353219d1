//! Persistent key/value storage.
//!
//! The next departure and the trip list live in a small key/value store.
//! Values are typed (bool, integer, string); reading a missing key or a key
//! holding another type yields the caller's default.

mod error;
mod file;
mod memory;
mod recent;
mod trips;

use serde::{Deserialize, Serialize};

pub use error::{StoreError, TripError};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use recent::{MAX_RECENT_STATIONS, RecentStations};
pub use trips::TripStore;

/// A single stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

/// Typed key/value storage.
///
/// Implementations are cheap cloneable handles onto shared storage.
pub trait KeyValueStore: Clone + Send + Sync + 'static {
    /// Read the raw value stored under `key`.
    fn load(&self, key: &str) -> Option<StoredValue>;

    /// Store `value` under `key`.
    fn store(&self, key: &str, value: StoredValue) -> Result<(), StoreError>;

    /// Remove `key`. Removing a missing key succeeds.
    fn delete(&self, key: &str) -> Result<(), StoreError>;

    fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.load(key) {
            Some(StoredValue::Bool(value)) => value,
            _ => default,
        }
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<(), StoreError> {
        self.store(key, StoredValue::Bool(value))
    }

    fn get_int(&self, key: &str, default: i64) -> i64 {
        match self.load(key) {
            Some(StoredValue::Int(value)) => value,
            _ => default,
        }
    }

    fn set_int(&self, key: &str, value: i64) -> Result<(), StoreError> {
        self.store(key, StoredValue::Int(value))
    }

    fn get_string(&self, key: &str, default: &str) -> String {
        match self.load(key) {
            Some(StoredValue::Text(value)) => value,
            _ => default.to_string(),
        }
    }

    fn set_string(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.store(key, StoredValue::Text(value.to_string()))
    }
}
