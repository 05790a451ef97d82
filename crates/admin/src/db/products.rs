//! Catalog administration: products and their variants.

use sqlx::PgPool;

use threadline_core::{ProductId, ProductStatus, VariantId};

use super::RepositoryError;
use crate::models::{Product, ProductInput, Variant, VariantInput, VariantUpdate};

const PRODUCT_COLUMNS: &str = "id, slug, title, description, base_price, status, image_url, \
                               customizable, created_at, updated_at";

const VARIANT_COLUMNS: &str = "id, product_id, sku, size, color, price_override, stock";

/// Repository for catalog writes.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// List products of every status, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, status: Option<ProductStatus>) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM store.product
            WHERE ($1::store.product_status IS NULL OR status = $1)
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(status)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM store.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Create a draft product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(&format!(
            r"
            INSERT INTO store.product (slug, title, description, base_price, image_url, customizable)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&input.slug)
        .bind(input.title.trim())
        .bind(&input.description)
        .bind(input.base_price)
        .bind(input.image_url.as_deref())
        .bind(input.customizable)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "slug"))
    }

    /// Replace a product's editable fields. Status is changed separately.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Conflict` if the new slug is taken.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(&format!(
            r"
            UPDATE store.product
            SET slug = $2, title = $3, description = $4, base_price = $5,
                image_url = $6, customizable = $7, updated_at = now()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&input.slug)
        .bind(input.title.trim())
        .bind(&input.description)
        .bind(input.base_price)
        .bind(input.image_url.as_deref())
        .bind(input.customizable)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "slug"))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Move a product to `status`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn set_status(
        &self,
        id: ProductId,
        status: ProductStatus,
    ) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(&format!(
            r"
            UPDATE store.product SET status = $2, updated_at = now()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a product that no order references.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if order lines reference it.
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let ordered = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM store.customer_order_item WHERE product_id = $1)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if ordered {
            return Err(RepositoryError::Conflict(
                "Product has orders; archive it instead".to_owned(),
            ));
        }

        let deleted = sqlx::query("DELETE FROM store.product WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    // Variants
    // =========================================================================

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

    /// Add a variant to a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the SKU is taken.
    pub async fn add_variant(
        &self,
        product_id: ProductId,
        input: &VariantInput,
    ) -> Result<Variant, RepositoryError> {
        sqlx::query_as::<_, Variant>(&format!(
            r"
            INSERT INTO store.product_variant (product_id, sku, size, color, price_override, stock)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {VARIANT_COLUMNS}
            "
        ))
        .bind(product_id)
        .bind(input.sku.trim())
        .bind(input.size.trim())
        .bind(input.color.trim())
        .bind(input.price_override)
        .bind(input.stock)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "SKU"))
    }

    /// Change a variant's price override and/or stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the variant does not exist.
    pub async fn update_variant(
        &self,
        id: VariantId,
        update: &VariantUpdate,
    ) -> Result<Variant, RepositoryError> {
        sqlx::query_as::<_, Variant>(&format!(
            r"
            UPDATE store.product_variant
            SET price_override = CASE WHEN $2 THEN NULL ELSE COALESCE($3, price_override) END,
                stock = COALESCE($4, stock)
            WHERE id = $1
            RETURNING {VARIANT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(update.clear_price_override)
        .bind(update.price_override)
        .bind(update.stock)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a variant that no order references.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if order lines reference it.
    /// Returns `RepositoryError::NotFound` if the variant does not exist.
    pub async fn delete_variant(&self, id: VariantId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM store.product_variant WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                    RepositoryError::Conflict("Variant has orders".to_owned())
                }
                other => RepositoryError::Database(other),
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
