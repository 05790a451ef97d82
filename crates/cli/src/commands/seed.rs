//! Catalog seeding from YAML.
//!
//! Designs upsert by name, products by slug and variants by SKU, so the
//! same file can be applied repeatedly.
//!
//! ```yaml
//! designs:
//!   - name: Mountain Line
//!     imageUrl: https://cdn.example/designs/mountain.png
//!     price: "6.00"
//! products:
//!   - slug: classic-tee
//!     title: Classic Tee
//!     basePrice: "24.00"
//!     customizable: true
//!     status: active
//!     variants:
//!       - { sku: TEE-M-BLK, size: M, color: Black, stock: 20 }
//! ```

use std::path::Path;

use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use thiserror::Error;

use threadline_admin::models::{DesignInput, ProductInput, VariantInput};
use threadline_core::{ProductId, ProductStatus};

/// Errors from `tl-cli seed catalog`.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Missing environment variable: STOREFRONT_DATABASE_URL (or DATABASE_URL)")]
    MissingDatabaseUrl,

    #[error("Cannot read {0}: {1}")]
    Read(String, std::io::Error),

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0}")]
    Invalid(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A catalog file.
#[derive(Debug, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub designs: Vec<DesignInput>,
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

/// A product with its variants.
#[derive(Debug, Deserialize)]
pub struct ProductSeed {
    #[serde(flatten)]
    pub product: ProductInput,
    #[serde(default = "default_status")]
    pub status: ProductStatus,
    #[serde(default)]
    pub variants: Vec<VariantInput>,
}

const fn default_status() -> ProductStatus {
    ProductStatus::Active
}

/// What a seed run touched.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub designs: usize,
    pub products: usize,
    pub variants: usize,
}

impl CatalogSeed {
    /// Parse a catalog file.
    ///
    /// # Errors
    ///
    /// Returns `SeedError::Yaml` for malformed YAML.
    pub fn parse(content: &str) -> Result<Self, SeedError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Check every entry before touching the database.
    ///
    /// # Errors
    ///
    /// Returns `SeedError::Invalid` naming the first bad entry.
    pub fn validate(&self) -> Result<(), SeedError> {
        for design in &self.designs {
            design
                .validate()
                .map_err(|e| SeedError::Invalid(format!("design {:?}: {e}", design.name)))?;
        }

        let mut skus = std::collections::HashSet::new();
        for seed in &self.products {
            let slug = &seed.product.slug;
            seed.product
                .validate()
                .map_err(|e| SeedError::Invalid(format!("product {slug:?}: {e}")))?;

            for variant in &seed.variants {
                variant
                    .validate()
                    .map_err(|e| SeedError::Invalid(format!("variant {:?}: {e}", variant.sku)))?;
                if !skus.insert(variant.sku.as_str()) {
                    return Err(SeedError::Invalid(format!(
                        "variant {:?} appears twice",
                        variant.sku
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Upsert the catalog in `file_path`.
///
/// # Errors
///
/// Returns `SeedError` if the file is unreadable or invalid, or if the
/// database rejects a row. Nothing is written unless every row succeeds.
pub async fn catalog(file_path: &str) -> Result<(), SeedError> {
    let path = Path::new(file_path);
    tracing::info!(path = %file_path, "Loading catalog from file");

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SeedError::Read(file_path.to_owned(), e))?;
    let seed = CatalogSeed::parse(&content)?;
    seed.validate()?;
    tracing::info!(
        designs = seed.designs.len(),
        products = seed.products.len(),
        "Catalog validated"
    );

    let database_url = super::database_url().ok_or(SeedError::MissingDatabaseUrl)?;
    let pool = super::connect(&database_url).await?;

    let summary = apply(&pool, &seed).await?;
    tracing::info!("Seeding complete!");
    tracing::info!("  Designs: {}", summary.designs);
    tracing::info!("  Products: {}", summary.products);
    tracing::info!("  Variants: {}", summary.variants);

    Ok(())
}

async fn apply(pool: &PgPool, seed: &CatalogSeed) -> Result<SeedSummary, SeedError> {
    let mut tx = pool.begin().await?;
    let mut summary = SeedSummary::default();

    for design in &seed.designs {
        upsert_design(&mut tx, design).await?;
        summary.designs += 1;
    }

    for product in &seed.products {
        let product_id = upsert_product(&mut tx, product).await?;
        summary.products += 1;

        for variant in &product.variants {
            upsert_variant(&mut tx, product_id, variant).await?;
            summary.variants += 1;
        }
    }

    tx.commit().await?;
    Ok(summary)
}

async fn upsert_design(conn: &mut PgConnection, design: &DesignInput) -> Result<(), SeedError> {
    sqlx::query(
        r"
        INSERT INTO store.design (name, image_url, price, active)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (name)
        DO UPDATE SET image_url = EXCLUDED.image_url, price = EXCLUDED.price,
                      active = EXCLUDED.active
        ",
    )
    .bind(&design.name)
    .bind(&design.image_url)
    .bind(design.price)
    .bind(design.active)
    .execute(conn)
    .await?;

    Ok(())
}

async fn upsert_product(conn: &mut PgConnection, seed: &ProductSeed) -> Result<ProductId, SeedError> {
    let product = &seed.product;
    let id = sqlx::query_scalar::<_, ProductId>(
        r"
        INSERT INTO store.product (slug, title, description, base_price, status, image_url, customizable)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (slug)
        DO UPDATE SET title = EXCLUDED.title, description = EXCLUDED.description,
                      base_price = EXCLUDED.base_price, status = EXCLUDED.status,
                      image_url = EXCLUDED.image_url, customizable = EXCLUDED.customizable,
                      updated_at = now()
        RETURNING id
        ",
    )
    .bind(&product.slug)
    .bind(&product.title)
    .bind(&product.description)
    .bind(product.base_price)
    .bind(seed.status)
    .bind(product.image_url.as_deref())
    .bind(product.customizable)
    .fetch_one(conn)
    .await?;

    Ok(id)
}

async fn upsert_variant(
    conn: &mut PgConnection,
    product_id: ProductId,
    variant: &VariantInput,
) -> Result<(), SeedError> {
    sqlx::query(
        r"
        INSERT INTO store.product_variant (product_id, sku, size, color, price_override, stock)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (sku)
        DO UPDATE SET product_id = EXCLUDED.product_id, size = EXCLUDED.size,
                      color = EXCLUDED.color, price_override = EXCLUDED.price_override,
                      stock = EXCLUDED.stock
        ",
    )
    .bind(product_id)
    .bind(&variant.sku)
    .bind(&variant.size)
    .bind(&variant.color)
    .bind(variant.price_override)
    .bind(variant.stock)
    .execute(conn)
    .await?;

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = include_str!("../../../../seed/catalog.yaml");

    #[test]
    fn test_sample_catalog_is_valid() {
        let seed = CatalogSeed::parse(SAMPLE).unwrap();
        seed.validate().unwrap();
        assert!(!seed.designs.is_empty());
        assert!(seed.products.iter().any(|p| p.product.customizable));
    }

    #[test]
    fn test_status_defaults_to_active() {
        let seed = CatalogSeed::parse(
            r#"
products:
  - slug: plain-cap
    title: Plain Cap
    basePrice: "18.00"
"#,
        )
        .unwrap();
        assert_eq!(seed.products[0].status, ProductStatus::Active);
        assert!(seed.products[0].variants.is_empty());
        assert!(seed.designs.is_empty());
    }

    #[test]
    fn test_rejects_bad_slug() {
        let seed = CatalogSeed::parse(
            r#"
products:
  - slug: Plain Cap
    title: Plain Cap
    basePrice: "18.00"
"#,
        )
        .unwrap();
        let err = seed.validate().unwrap_err();
        assert!(err.to_string().contains("Plain Cap"));
    }

    #[test]
    fn test_rejects_duplicate_sku() {
        let seed = CatalogSeed::parse(
            r#"
products:
  - slug: cap
    title: Cap
    basePrice: "18.00"
    variants:
      - { sku: CAP-1, size: OS, color: Navy, stock: 3 }
  - slug: cap-two
    title: Cap Two
    basePrice: "18.00"
    variants:
      - { sku: CAP-1, size: OS, color: Red, stock: 3 }
"#,
        )
        .unwrap();
        assert!(matches!(seed.validate(), Err(SeedError::Invalid(_))));
    }

    #[test]
    fn test_rejects_negative_stock() {
        let seed = CatalogSeed::parse(
            r#"
products:
  - slug: cap
    title: Cap
    basePrice: "18.00"
    variants:
      - { sku: CAP-1, size: OS, color: Navy, stock: -1 }
"#,
        )
        .unwrap();
        assert!(matches!(seed.validate(), Err(SeedError::Invalid(_))));
    }
}
