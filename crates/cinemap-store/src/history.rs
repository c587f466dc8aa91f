//! Recent place-search queries, newest first.

use std::sync::Arc;

use crate::kv::{KeyValueStore, Namespace};
use crate::StoreError;

const HISTORY_KEY: &str = "queries";
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

pub struct SearchHistory {
    store: Arc<dyn KeyValueStore>,
    limit: usize,
}

impl SearchHistory {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, limit: usize) -> Self {
        Self {
            store,
            limit: limit.max(1),
        }
    }

    /// Move `query` to the front of the history, dropping duplicates
    /// (case-insensitive) and anything past the limit. Blank queries are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the history cannot be read or written.
    pub async fn record(&self, query: &str) -> Result<(), StoreError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(());
        }

        let mut entries = self.recent().await?;
        entries.retain(|existing| !existing.eq_ignore_ascii_case(query));
        entries.insert(0, query.to_owned());
        entries.truncate(self.limit);

        let raw = serde_json::to_string(&entries).map_err(|source| StoreError::Serialize {
            context: HISTORY_KEY.to_owned(),
            source,
        })?;
        self.store
            .set(Namespace::SearchHistory, HISTORY_KEY, &raw)
            .await
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] when the history cannot be read or decoded.
    pub async fn recent(&self) -> Result<Vec<String>, StoreError> {
        let Some(raw) = self.store.get(Namespace::SearchHistory, HISTORY_KEY).await? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw).map_err(|source| StoreError::Serialize {
            context: HISTORY_KEY.to_owned(),
            source,
        })
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] when the history cannot be removed.
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.store.remove(Namespace::SearchHistory, HISTORY_KEY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;

    fn history(limit: usize) -> SearchHistory {
        SearchHistory::new(Arc::new(MemoryStore::new()), limit)
    }

    #[tokio::test]
    async fn newest_first_without_duplicates() {
        let h = history(DEFAULT_HISTORY_LIMIT);
        h.record("Central").await.unwrap();
        h.record("Mong Kok").await.unwrap();
        h.record("central").await.unwrap();
        assert_eq!(h.recent().await.unwrap(), ["central", "Mong Kok"]);
    }

    #[tokio::test]
    async fn truncates_to_limit() {
        let h = history(2);
        for q in ["a", "b", "c"] {
            h.record(q).await.unwrap();
        }
        assert_eq!(h.recent().await.unwrap(), ["c", "b"]);
    }

    #[tokio::test]
    async fn blank_query_is_ignored() {
        let h = history(5);
        h.record("   ").await.unwrap();
        assert!(h.recent().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn clear_empties_history() {
        let h = history(5);
        h.record("Tsim Sha Tsui").await.unwrap();
        h.clear().await.unwrap();
        assert!(h.recent().await.unwrap().is_empty());
    }
}
