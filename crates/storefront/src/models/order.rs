//! Order types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use threadline_core::{
    DesignId, OrderId, OrderItemId, OrderStatus, Placement, Price, ProductId, UserId, VariantId,
};

use super::AddressSnapshot;

/// An order header.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub order_number: String,
    pub status: OrderStatus,
    pub subtotal: Price,
    pub shipping: Price,
    pub total: Price,
    pub shipping_address: Json<AddressSnapshot>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Customization details frozen onto an order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomizationSnapshot {
    pub design_id: DesignId,
    pub design_name: String,
    pub thread_color_hex: String,
    pub position: Placement,
}

/// An order line.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub product_title: String,
    pub variant_label: String,
    pub customization: Option<Json<CustomizationSnapshot>>,
    pub quantity: i32,
    pub unit_price: Price,
    pub line_total: Price,
}

/// An order with its lines.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}
