//! SQLite-backed [`KeyValueStore`].

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::kv::{KeyValueStore, Namespace};
use crate::StoreError;

const ACQUIRE_TIMEOUT_SECS: u64 = 5;

// Path relative to crates/cinemap-store/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

/// Key-value rows in a single `kv_entries` table, keyed by
/// `(namespace, key)`.
///
/// The pool holds exactly one connection that never idles out, so
/// `sqlite::memory:` databases survive for the lifetime of the store.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `database_url`.
    ///
    /// Call [`SqliteStore::init`] before first use.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] if the URL is malformed or the database
    /// cannot be opened.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// Apply pending schema migrations. Idempotent.
    ///
    /// Returns the number of migrations applied by this call.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Migration`] if a migration fails.
    pub async fn init(&self) -> Result<usize, StoreError> {
        let applied_before = self.applied_migrations().await;
        MIGRATOR.run(&self.pool).await?;
        let applied = self.applied_migrations().await.saturating_sub(applied_before);
        tracing::debug!(applied, "kv_entries schema ready");
        Ok(applied)
    }

    /// `_sqlx_migrations` does not exist on a fresh database; that counts as
    /// zero applied.
    async fn applied_migrations(&self) -> usize {
        let count: i64 =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
                .fetch_one(&self.pool)
                .await
                .unwrap_or(0);
        usize::try_from(count).unwrap_or(0)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, namespace: Namespace, key: &str) -> Result<Option<String>, StoreError> {
        let value = sqlx::query_scalar::<_, String>(
            "SELECT value FROM kv_entries WHERE namespace = ? AND key = ?",
        )
        .bind(namespace.as_str())
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(value)
    }

    async fn set(&self, namespace: Namespace, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO kv_entries (namespace, key, value, updated_at) \
             VALUES (?, ?, ?, ?) \
             ON CONFLICT (namespace, key) \
             DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(namespace.as_str())
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, namespace: Namespace, key: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM kv_entries WHERE namespace = ? AND key = ?")
            .bind(namespace.as_str())
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
