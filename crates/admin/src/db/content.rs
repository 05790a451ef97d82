//! Content blocks in `store.setting`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use threadline_core::ContentKey;

use super::RepositoryError;

/// A content block.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ContentBlock {
    pub key: String,
    pub value: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

/// Repository for content blocks.
pub struct ContentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ContentRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All content blocks by key.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<ContentBlock>, RepositoryError> {
        let blocks = sqlx::query_as::<_, ContentBlock>(
            "SELECT key, value, updated_at FROM store.setting ORDER BY key",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(blocks)
    }

    /// Insert or replace a block.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        key: &ContentKey,
        value: &serde_json::Value,
    ) -> Result<ContentBlock, RepositoryError> {
        let block = sqlx::query_as::<_, ContentBlock>(
            r"
            INSERT INTO store.setting (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key)
            DO UPDATE SET value = EXCLUDED.value, updated_at = now()
            RETURNING key, value, updated_at
            ",
        )
        .bind(key.as_str())
        .bind(value)
        .fetch_one(self.pool)
        .await?;

        Ok(block)
    }

    /// Delete a block.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no block has that key.
    pub async fn delete(&self, key: &ContentKey) -> Result<(), RepositoryError> {
        let deleted = sqlx::query("DELETE FROM store.setting WHERE key = $1")
            .bind(key.as_str())
            .execute(self.pool)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
