//! Namespaced key-value storage contract.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::StoreError;

/// Logical partitions of the local store. Each repository owns one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    TheatreCache,
    SearchHistory,
}

impl Namespace {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Namespace::TheatreCache => "theatre_cache",
            Namespace::SearchHistory => "search_history",
        }
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// String-valued storage with `get`/`set`/`remove` per namespace.
///
/// Implementations are injected into repositories at startup; nothing in the
/// workspace reaches for ambient global storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value, or `None` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend cannot be read.
    async fn get(&self, namespace: Namespace, key: &str) -> Result<Option<String>, StoreError>;

    /// Inserts or overwrites a value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend cannot be written.
    async fn set(&self, namespace: Namespace, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes a key. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend cannot be written.
    async fn remove(&self, namespace: Namespace, key: &str) -> Result<(), StoreError>;
}

/// Process-local store. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<(Namespace, String), String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, namespace: Namespace, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().await;
        Ok(entries.get(&(namespace, key.to_owned())).cloned())
    }

    async fn set(&self, namespace: Namespace, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        entries.insert((namespace, key.to_owned()), value.to_owned());
        Ok(())
    }

    async fn remove(&self, namespace: Namespace, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        entries.remove(&(namespace, key.to_owned()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn namespaces_are_isolated() {
        let store = MemoryStore::new();
        store
            .set(Namespace::TheatreCache, "k", "cache")
            .await
            .unwrap();
        store
            .set(Namespace::SearchHistory, "k", "history")
            .await
            .unwrap();

        assert_eq!(
            store.get(Namespace::TheatreCache, "k").await.unwrap(),
            Some("cache".to_owned())
        );
        store.remove(Namespace::TheatreCache, "k").await.unwrap();
        assert_eq!(store.get(Namespace::TheatreCache, "k").await.unwrap(), None);
        assert_eq!(
            store.get(Namespace::SearchHistory, "k").await.unwrap(),
            Some("history".to_owned())
        );
    }

    #[tokio::test]
    async fn remove_absent_key_is_ok() {
        let store = MemoryStore::new();
        assert!(store.remove(Namespace::TheatreCache, "missing").await.is_ok());
    }
}
