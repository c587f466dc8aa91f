//! Local persistence for cinemap.
//!
//! A small namespaced key-value repository ([`KeyValueStore`]) with a SQLite
//! backend for the app and an in-memory backend for tests, plus the typed
//! repositories built on it: the regional [`TheatreCache`] and the place
//! [`SearchHistory`].

pub mod cache;
pub mod history;
pub mod kv;
pub mod sqlite;

pub use cache::{CacheOptions, TheatreCache};
pub use history::SearchHistory;
pub use kv::{KeyValueStore, MemoryStore, Namespace};
pub use sqlite::SqliteStore;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("could not encode or decode stored value for {context}: {source}")]
    Serialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
