//! FunctionStorage trait for persisting function values between passes.

use indexmap::IndexMap;
use quire_types::FunctionStorageKey;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::RwLock;
use thiserror::Error;

/// Function name to value, in registration order.
pub type StoredValues = IndexMap<String, Value>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
    #[error("Function storage for '{key}' is unavailable: {message}")]
    Unavailable { key: String, message: String },
}

/// A key-value store of function results, scoped by report instantiation.
///
/// The store is shared between passes; callers running several passes of the
/// same report concurrently must synchronize externally.
pub trait FunctionStorage: Send + Sync + Debug {
    /// Returns the values stored for `key`, if any.
    fn get(&self, key: &FunctionStorageKey) -> Option<StoredValues>;

    /// Stores `values` for `key`, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` if the backing store cannot be written.
    fn put(&self, key: FunctionStorageKey, values: StoredValues) -> Result<(), StorageError>;

    /// Number of stored scopes.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An in-memory function storage.
#[derive(Debug, Default)]
pub struct InMemoryFunctionStorage {
    entries: RwLock<HashMap<FunctionStorageKey, StoredValues>>,
}

impl InMemoryFunctionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every stored scope.
    ///
    /// Does nothing if the lock is poisoned.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }
}

impl FunctionStorage for InMemoryFunctionStorage {
    fn get(&self, key: &FunctionStorageKey) -> Option<StoredValues> {
        self.entries.read().ok()?.get(key).cloned()
    }

    fn put(&self, key: FunctionStorageKey, values: StoredValues) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(|_| StorageError::Unavailable {
            key: key.to_string(),
            message: "function storage lock poisoned".to_string(),
        })?;
        entries.insert(key, values);
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_types::InstanceId;
    use serde_json::json;

    #[test]
    fn test_put_and_get() {
        let storage = InMemoryFunctionStorage::new();
        let key = FunctionStorageKey::for_report(InstanceId::generate(), "orders");
        assert!(storage.is_empty());
        assert_eq!(storage.get(&key), None);

        let mut values = StoredValues::new();
        values.insert("total".to_string(), json!(42));
        storage.put(key.clone(), values.clone()).unwrap();

        assert_eq!(storage.len(), 1);
        assert_eq!(storage.get(&key), Some(values));
    }

    #[test]
    fn test_put_replaces_previous_values() {
        let storage = InMemoryFunctionStorage::new();
        let key = FunctionStorageKey::for_report(InstanceId::generate(), "orders");

        let mut first = StoredValues::new();
        first.insert("total".to_string(), json!(1));
        storage.put(key.clone(), first).unwrap();

        let mut second = StoredValues::new();
        second.insert("total".to_string(), json!(2));
        storage.put(key.clone(), second).unwrap();

        assert_eq!(storage.len(), 1);
        assert_eq!(storage.get(&key).unwrap()["total"], json!(2));

        storage.clear();
        assert!(storage.is_empty());
    }
}
