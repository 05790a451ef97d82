//! Server-side cart types.

use serde::Serialize;

use threadline_core::{
    CartId, CartItemId, CustomizationId, DesignId, Placement, Price, ProductId, ProductStatus,
    UserId, VariantId,
};

/// The cart header row with its derived totals.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub id: CartId,
    pub user_id: UserId,
    pub subtotal: Price,
    pub item_count: i32,
}

/// A cart line joined with its product, variant and customization.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub product_slug: String,
    pub product_title: String,
    pub product_status: ProductStatus,
    pub variant_id: VariantId,
    pub sku: String,
    pub size: String,
    pub color: String,
    pub stock: i32,
    pub customization_id: Option<CustomizationId>,
    pub design_id: Option<DesignId>,
    pub design_name: Option<String>,
    pub thread_color_hex: Option<String>,
    pub position: Option<Placement>,
    pub quantity: i32,
    pub unit_price: Price,
    pub line_total: Price,
}

impl CartLine {
    /// Human label of the variant, e.g. `M / Heather Grey`.
    #[must_use]
    pub fn variant_label(&self) -> String {
        format!("{} / {}", self.size, self.color)
    }
}

/// A signed-in user's cart.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub id: CartId,
    pub lines: Vec<CartLine>,
    pub subtotal: Price,
    pub item_count: i32,
}

impl CartView {
    #[must_use]
    pub fn new(summary: CartSummary, lines: Vec<CartLine>) -> Self {
        Self {
            id: summary.id,
            lines,
            subtotal: summary.subtotal,
            item_count: summary.item_count,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
