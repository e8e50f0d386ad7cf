use std::cell::RefCell;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage rejected the write: {0}")]
    Rejected(String),
    #[error("malformed storage payload: {0}")]
    Malformed(String),
}

/// The host's asynchronous key/value store.
///
/// Keys missing from the store are absent from the returned map; they are
/// not an error.
#[async_trait(?Send)]
pub trait KeyValueStore {
    async fn get(&self, keys: &[String]) -> Result<Map<String, Value>, StoreError>;
    async fn set(&self, entries: Map<String, Value>) -> Result<(), StoreError>;
}

/// In-process store, last write wins per key.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<Map<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Map<String, Value> {
        self.entries.borrow().clone()
    }
}

#[async_trait(?Send)]
impl KeyValueStore for MemoryStore {
    async fn get(&self, keys: &[String]) -> Result<Map<String, Value>, StoreError> {
        let entries = self.entries.borrow();
        Ok(keys
            .iter()
            .filter_map(|key| entries.get(key).map(|value| (key.clone(), value.clone())))
            .collect())
    }

    async fn set(&self, entries: Map<String, Value>) -> Result<(), StoreError> {
        self.entries.borrow_mut().extend(entries);
        Ok(())
    }
}
