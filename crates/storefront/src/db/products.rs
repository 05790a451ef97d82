//! Catalog reads for the storefront.
//!
//! Shoppers only ever see `active` products; drafts and archived products
//! are filtered in SQL.

use sqlx::PgPool;

use threadline_core::{ProductId, ProductStatus, VariantId};

use super::RepositoryError;
use crate::models::{Product, Variant};

const PRODUCT_COLUMNS: &str = "id, slug, title, description, base_price, status, image_url, \
                               customizable, created_at, updated_at";

const VARIANT_COLUMNS: &str = "id, product_id, sku, size, color, price_override, stock";

/// Repository for catalog reads.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List active products, newest first, optionally filtered by title.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM store.product
            WHERE status = $1
              AND ($2::TEXT IS NULL OR title ILIKE '%' || $2 || '%')
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "
        ))
        .bind(ProductStatus::Active)
        .bind(search)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Count active products matching the same filter as [`Self::list_active`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_active(&self, search: Option<&str>) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            r"
            SELECT COUNT(*)
            FROM store.product
            WHERE status = $1
              AND ($2::TEXT IS NULL OR title ILIKE '%' || $2 || '%')
            ",
        )
        .bind(ProductStatus::Active)
        .bind(search)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// Get an active product by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM store.product WHERE slug = $1 AND status = $2"
        ))
        .bind(slug)
        .bind(ProductStatus::Active)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Get a product by ID regardless of status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM store.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Variants of a product, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn variants(&self, product_id: ProductId) -> Result<Vec<Variant>, RepositoryError> {
        let variants = sqlx::query_as::<_, Variant>(&format!(
            "SELECT {VARIANT_COLUMNS} FROM store.product_variant WHERE product_id = $1 ORDER BY id"
        ))
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(variants)
    }

    /// Get a variant by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_variant(&self, id: VariantId) -> Result<Option<Variant>, RepositoryError> {
        let variant = sqlx::query_as::<_, Variant>(&format!(
            "SELECT {VARIANT_COLUMNS} FROM store.product_variant WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(variant)
    }
}
