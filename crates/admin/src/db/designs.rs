//! Embroidery design administration.

use sqlx::PgPool;

use threadline_core::DesignId;

use super::RepositoryError;
use crate::models::{Design, DesignInput};

const DESIGN_COLUMNS: &str = "id, name, image_url, price, active";

/// Repository for designs.
pub struct DesignRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DesignRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All designs, active or not, by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Design>, RepositoryError> {
        let designs = sqlx::query_as::<_, Design>(&format!(
            "SELECT {DESIGN_COLUMNS} FROM store.design ORDER BY name"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(designs)
    }

    /// Create a design.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is taken.
    pub async fn create(&self, input: &DesignInput) -> Result<Design, RepositoryError> {
        sqlx::query_as::<_, Design>(&format!(
            r"
            INSERT INTO store.design (name, image_url, price, active)
            VALUES ($1, $2, $3, $4)
            RETURNING {DESIGN_COLUMNS}
            "
        ))
        .bind(input.name.trim())
        .bind(input.image_url.trim())
        .bind(input.price)
        .bind(input.active)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "design name"))
    }

    /// Replace a design's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the design does not exist.
    /// Returns `RepositoryError::Conflict` if the name is taken.
    pub async fn update(&self, id: DesignId, input: &DesignInput) -> Result<Design, RepositoryError> {
        sqlx::query_as::<_, Design>(&format!(
            r"
            UPDATE store.design
            SET name = $2, image_url = $3, price = $4, active = $5
            WHERE id = $1
            RETURNING {DESIGN_COLUMNS}
            "
        ))
        .bind(id)
        .bind(input.name.trim())
        .bind(input.image_url.trim())
        .bind(input.price)
        .bind(input.active)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "design name"))?
        .ok_or(RepositoryError::NotFound)
    }
}
