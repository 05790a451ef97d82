//! Saved customizations.

use sqlx::PgPool;

use threadline_core::{
    CustomizationId, DesignId, Placement, ProductId, ThreadColor, UserId, VariantId,
};

use super::RepositoryError;
use crate::models::Customization;

const CUSTOMIZATION_COLUMNS: &str = "id, user_id, product_id, variant_id, design_id, \
                                     thread_color_hex, position, preview_image_url, created_at";

/// A customization about to be saved.
#[derive(Debug, Clone)]
pub struct NewCustomization<'a> {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub design_id: DesignId,
    pub thread_color: &'a ThreadColor,
    pub position: Placement,
    pub preview_image_url: Option<&'a str>,
}

/// Repository for saved customizations.
pub struct CustomizationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomizationRepository<'a> {
    /// Create a new customization repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Save a customization.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        new: &NewCustomization<'_>,
    ) -> Result<Customization, RepositoryError> {
        let customization = sqlx::query_as::<_, Customization>(&format!(
            r"
            INSERT INTO store.customization
                (user_id, product_id, variant_id, design_id, thread_color_hex, position, preview_image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {CUSTOMIZATION_COLUMNS}
            "
        ))
        .bind(new.user_id)
        .bind(new.product_id)
        .bind(new.variant_id)
        .bind(new.design_id)
        .bind(new.thread_color.as_str())
        .bind(new.position)
        .bind(new.preview_image_url)
        .fetch_one(self.pool)
        .await?;

        Ok(customization)
    }

    /// Get a customization by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CustomizationId) -> Result<Option<Customization>, RepositoryError> {
        let customization = sqlx::query_as::<_, Customization>(&format!(
            "SELECT {CUSTOMIZATION_COLUMNS} FROM store.customization WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(customization)
    }
}
