//! Key/value storage backing the credential store

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use thiserror::Error;

/// Storage error types
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing store cannot be reached (e.g. disabled browser storage)
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// The backing store refused a write
    #[error("Failed to write {key}: {reason}")]
    WriteRejected { key: String, reason: String },

    /// A value could not be encoded for storage
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persisted string key/value state, the shape of browser `localStorage`
pub trait KeyValueStorage: Send + Sync {
    /// Read a value, `None` when the key is absent
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key; removing an absent key is not an error
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process storage used on native targets and in tests
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}
