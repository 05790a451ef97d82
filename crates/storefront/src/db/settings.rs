//! Content blocks stored in `store.setting`.

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

/// Read-only access to content blocks.
pub struct SettingsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SettingsRepository<'a> {
    /// Create a new settings repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a content block by key.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, key: &ContentKey) -> Result<Option<ContentBlock>, RepositoryError> {
        let block = sqlx::query_as::<_, ContentBlock>(
            "SELECT key, value, updated_at FROM store.setting WHERE key = $1",
        )
        .bind(key.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(block)
    }
}
