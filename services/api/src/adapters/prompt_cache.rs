//! services/api/src/adapters/prompt_cache.rs
//!
//! This module contains the prompt cache adapters, the concrete implementations
//! of the `KeyValueCache` port from the `core` crate. `PgPromptCache` keeps
//! generated prompts in PostgreSQL using `sqlx`; `MemoryPromptCache` keeps them
//! in-process for deployments without a database.

use async_trait::async_trait;
use journal_core::ports::{KeyValueCache, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use tokio::sync::RwLock;

//=========================================================================================
// The PostgreSQL Adapter
//=========================================================================================

/// A cache adapter that implements the `KeyValueCache` port on top of Postgres.
#[derive(Clone)]
pub struct PgPromptCache {
    pool: PgPool,
}

impl PgPromptCache {
    /// Creates a new `PgPromptCache`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Number of stored prompts, for startup logging.
    pub async fn entry_count(&self) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM prompt_cache")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct PromptCacheRecord {
    prompt_text: String,
}

//=========================================================================================
// `KeyValueCache` Trait Implementation
//=========================================================================================

#[async_trait]
impl KeyValueCache for PgPromptCache {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        let record = sqlx::query_as::<_, PromptCacheRecord>(
            "SELECT prompt_text FROM prompt_cache WHERE cache_key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(record.map(|r| r.prompt_text))
    }

    /// The first text written for a key wins; later writes are ignored.
    async fn put(&self, key: &str, value: &str) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO prompt_cache (cache_key, prompt_text) VALUES ($1, $2) \
             ON CONFLICT (cache_key) DO NOTHING",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn clear(&self) -> PortResult<()> {
        sqlx::query("DELETE FROM prompt_cache")
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }
}

//=========================================================================================
// The In-Memory Adapter
//=========================================================================================

/// Keeps prompts for the lifetime of the process.
#[derive(Default)]
pub struct MemoryPromptCache {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryPromptCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueCache for MemoryPromptCache {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> PortResult<()> {
        self.entries
            .write()
            .await
            .entry(key.to_string())
            .or_insert_with(|| value.to_string());
        Ok(())
    }

    async fn clear(&self) -> PortResult<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_cache_keeps_first_write() {
        let cache = MemoryPromptCache::new();
        assert_eq!(cache.get("goal_1_100").await.unwrap(), None);

        cache.put("goal_1_100", "Picture the harbour.").await.unwrap();
        cache.put("goal_1_100", "Something else.").await.unwrap();
        assert_eq!(
            cache.get("goal_1_100").await.unwrap().as_deref(),
            Some("Picture the harbour.")
        );
    }

    #[tokio::test]
    async fn memory_cache_clear_drops_everything() {
        let cache = MemoryPromptCache::new();
        cache.put("a", "one").await.unwrap();
        cache.put("b", "two").await.unwrap();

        cache.clear().await.unwrap();
        assert_eq!(cache.get("a").await.unwrap(), None);
        assert_eq!(cache.get("b").await.unwrap(), None);
    }
}
