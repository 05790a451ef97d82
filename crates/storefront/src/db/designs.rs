//! Embroidery design reads.

use sqlx::PgPool;

use threadline_core::DesignId;

use super::RepositoryError;
use crate::models::Design;

/// Repository for embroidery designs.
pub struct DesignRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DesignRepository<'a> {
    /// Create a new design repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Designs offered in the studio.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<Design>, RepositoryError> {
        let designs = sqlx::query_as::<_, Design>(
            "SELECT id, name, image_url, price, active FROM store.design WHERE active ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(designs)
    }

    /// Get a design by ID, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: DesignId) -> Result<Option<Design>, RepositoryError> {
        let design = sqlx::query_as::<_, Design>(
            "SELECT id, name, image_url, price, active FROM store.design WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(design)
    }
}
