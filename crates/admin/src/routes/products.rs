//! Product and variant management.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use threadline_core::{ActionResult, ProductId, ProductStatus, VariantId};

use crate::db::ProductRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireAdmin;
use crate::models::{Product, ProductInput, Variant, VariantInput, VariantUpdate};
use crate::state::AppState;

/// `?status=` filter for the product list.
#[derive(Debug, Deserialize)]
pub struct ProductFilter {
    pub status: Option<ProductStatus>,
}

/// Status change body.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: ProductStatus,
}

/// A product with all its variants.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductWithVariants {
    #[serde(flatten)]
    pub product: Product,
    pub variants: Vec<Variant>,
}

// =============================================================================
// Products
// =============================================================================

/// All products, optionally filtered by status.
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(
        ProductRepository::new(state.pool()).list(filter.status).await?,
    ))
}

/// Create a draft product.
#[instrument(skip(state, admin, input), fields(user_id = %admin.id, slug = %input.slug))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<ProductInput>,
) -> Result<Json<ActionResult<Product>>> {
    input.validate().map_err(AppError::BadRequest)?;

    let product = ProductRepository::new(state.pool()).create(&input).await?;
    add_breadcrumb("catalog", "Product created");
    tracing::info!(product_id = %product.id, "Product created");

    Ok(Json(
        ActionResult::ok_with(product).with_message("Product created"),
    ))
}

/// One product with its variants.
#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductWithVariants>> {
    let products = ProductRepository::new(state.pool());
    let product = products
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    let variants = products.variants(id).await?;

    Ok(Json(ProductWithVariants { product, variants }))
}

/// Replace a product's editable fields.
#[instrument(skip(state, admin, input), fields(user_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(input): Json<ProductInput>,
) -> Result<Json<ActionResult<Product>>> {
    input.validate().map_err(AppError::BadRequest)?;

    let product = ProductRepository::new(state.pool())
        .update(id, &input)
        .await?;

    Ok(Json(
        ActionResult::ok_with(product).with_message("Product saved"),
    ))
}

/// Move a product between draft, active and archived.
#[instrument(skip(state, admin, form), fields(user_id = %admin.id, status = %form.status))]
pub async fn set_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(form): Json<StatusForm>,
) -> Result<Json<ActionResult<Product>>> {
    let product = ProductRepository::new(state.pool())
        .set_status(id, form.status)
        .await?;
    tracing::info!(product_id = %id, "Product status changed");

    Ok(Json(
        ActionResult::ok_with(product).with_message(format!("Product is now {}", form.status)),
    ))
}

/// Delete a product that was never ordered.
#[instrument(skip(state, admin), fields(user_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Json<ActionResult>> {
    ProductRepository::new(state.pool()).delete(id).await?;
    add_breadcrumb("catalog", "Product deleted");
    tracing::info!(product_id = %id, "Product deleted");

    Ok(Json(ActionResult::ok().with_message("Product deleted")))
}

// =============================================================================
// Variants
// =============================================================================

/// Add a variant.
#[instrument(skip(state, admin, input), fields(user_id = %admin.id, sku = %input.sku))]
pub async fn add_variant(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(product_id): Path<ProductId>,
    Json(input): Json<VariantInput>,
) -> Result<Json<ActionResult<Variant>>> {
    input.validate().map_err(AppError::BadRequest)?;

    let products = ProductRepository::new(state.pool());
    if products.get(product_id).await?.is_none() {
        return Err(AppError::NotFound(format!("product {product_id}")));
    }
    let variant = products.add_variant(product_id, &input).await?;

    Ok(Json(
        ActionResult::ok_with(variant).with_message("Variant added"),
    ))
}

/// Change a variant's price override or stock.
#[instrument(skip(state, admin, update), fields(user_id = %admin.id))]
pub async fn update_variant(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<VariantId>,
    Json(update): Json<VariantUpdate>,
) -> Result<Json<ActionResult<Variant>>> {
    update.validate().map_err(AppError::BadRequest)?;

    let variant = ProductRepository::new(state.pool())
        .update_variant(id, &update)
        .await?;

    Ok(Json(
        ActionResult::ok_with(variant).with_message("Variant saved"),
    ))
}

/// Delete a variant that was never ordered.
#[instrument(skip(state, admin), fields(user_id = %admin.id))]
pub async fn delete_variant(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<VariantId>,
) -> Result<Json<ActionResult>> {
    ProductRepository::new(state.pool()).delete_variant(id).await?;
    Ok(Json(ActionResult::ok().with_message("Variant deleted")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_form_parses_snake_case() {
        let form: StatusForm = serde_json::from_str(r#"{"status":"archived"}"#).unwrap();
        assert_eq!(form.status, ProductStatus::Archived);
        assert!(serde_json::from_str::<StatusForm>(r#"{"status":"deleted"}"#).is_err());
    }
}
