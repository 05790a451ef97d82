//! The customization studio.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use threadline_core::{
    DesignId, Placement, Price, ProductId, ThreadColor, ThreadColorError, UserId, VariantId,
};

use crate::db::customizations::NewCustomization;
use crate::db::{CustomizationRepository, DesignRepository, ProductRepository, RepositoryError};
use crate::models::Customization;

/// Errors from the studio.
#[derive(Debug, Error)]
pub enum StudioError {
    #[error("invalid thread color: {0}")]
    InvalidColor(#[from] ThreadColorError),

    #[error("design is not available")]
    DesignUnavailable,

    #[error("product cannot be customized")]
    NotCustomizable,

    #[error("variant does not belong to product")]
    VariantMismatch,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// A customization submitted from the studio.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomizationRequest {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub design_id: DesignId,
    pub thread_color_hex: String,
    pub position: Placement,
    #[serde(default)]
    pub preview_image_url: Option<String>,
}

/// A saved customization with the price it adds to the garment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedCustomization {
    #[serde(flatten)]
    pub customization: Customization,
    pub add_on_price: Price,
}

/// Validate and persist a customization for `user_id`.
///
/// # Errors
///
/// Returns a `StudioError` if the color is malformed or the design, product
/// or variant cannot take this customization.
#[instrument(skip(pool, request), fields(design_id = %request.design_id))]
pub async fn create_customization(
    pool: &PgPool,
    user_id: UserId,
    request: &CustomizationRequest,
) -> Result<SavedCustomization, StudioError> {
    let color = ThreadColor::parse(&request.thread_color_hex)?;

    let design = DesignRepository::new(pool)
        .get(request.design_id)
        .await?
        .filter(|d| d.active)
        .ok_or(StudioError::DesignUnavailable)?;

    let products = ProductRepository::new(pool);
    let product = products
        .get_by_id(request.product_id)
        .await?
        .filter(|p| p.is_purchasable() && p.customizable)
        .ok_or(StudioError::NotCustomizable)?;
    products
        .get_variant(request.variant_id)
        .await?
        .filter(|v| v.product_id == product.id)
        .ok_or(StudioError::VariantMismatch)?;

    let preview = request
        .preview_image_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty());

    let customization = CustomizationRepository::new(pool)
        .create(&NewCustomization {
            user_id,
            product_id: product.id,
            variant_id: request.variant_id,
            design_id: design.id,
            thread_color: &color,
            position: request.position,
            preview_image_url: preview,
        })
        .await?;

    Ok(SavedCustomization {
        customization,
        add_on_price: design.price,
    })
}
