//! Persistence
//!
//! A synchronous, string-keyed durable medium and the records the storefront
//! keeps in it.

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::warn;

use crate::persistence::snapshot::SnapshotError;

pub mod file;
pub mod listener;
pub mod memory;
pub mod snapshot;

/// Key under which the cart snapshot is stored.
pub const CART_STORAGE_KEY: &str = "strongfitness-cart";

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO error reading or writing the medium.
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Key cannot be used with this backend.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
}

/// Errors writing a record to storage.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Storage backend failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Cart snapshot could not be encoded.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    /// Record could not be serialised.
    #[error("failed to serialise record: {0}")]
    Json(#[from] serde_json::Error),
}

/// String-keyed durable medium.
///
/// Writes complete before returning; there is no buffered state.
pub trait KeyValueStore {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if the medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if the medium cannot be written.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if the medium cannot be written.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Load a JSON record, treating a missing, unreadable or malformed record as absent.
pub fn load_record<T, S>(store: &S, key: &str) -> Option<T>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let raw = match store.get(key) {
        Ok(raw) => raw?,
        Err(err) => {
            warn!(key, error = %err, "failed to read record, ignoring it");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(record) => Some(record),
        Err(err) => {
            warn!(key, error = %err, "discarding malformed record");
            None
        }
    }
}

/// Store a record as JSON.
///
/// # Errors
///
/// Returns a `PersistenceError` if the record cannot be serialised or written.
pub fn save_record<T, S>(store: &mut S, key: &str, record: &T) -> Result<(), PersistenceError>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let raw = serde_json::to_string(record)?;

    store.set(key, &raw)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use testresult::TestResult;

    use super::{memory::MemoryStore, *};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Record {
        name: String,
    }

    #[test]
    fn records_round_trip() -> TestResult {
        let mut store = MemoryStore::new();
        let record = Record {
            name: "Camiseta".to_string(),
        };

        save_record(&mut store, "record", &record)?;

        assert_eq!(load_record::<Record, _>(&store, "record"), Some(record));

        Ok(())
    }

    #[test]
    fn missing_record_is_absent() {
        let store = MemoryStore::new();

        assert_eq!(load_record::<Record, _>(&store, "record"), None);
    }

    #[test]
    fn malformed_record_is_absent() -> TestResult {
        let mut store = MemoryStore::new();

        store.set("record", "{not json")?;

        assert_eq!(load_record::<Record, _>(&store, "record"), None);

        Ok(())
    }
}
