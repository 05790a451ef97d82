//! Saved garment customizations.

use chrono::{DateTime, Utc};
use serde::Serialize;

use threadline_core::{CustomizationId, DesignId, Placement, ProductId, UserId, VariantId};

/// A customization persisted for a signed-in user.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Customization {
    pub id: CustomizationId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub design_id: DesignId,
    pub thread_color_hex: String,
    pub position: Placement,
    pub preview_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}
