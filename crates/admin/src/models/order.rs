//! Orders as the console sees them: every customer, every status.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;

use threadline_core::{OrderId, OrderItemId, OrderStatus, Price, ProductId, UserId, VariantId};

/// An order header joined with its customer's email.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub customer_email: String,
    pub order_number: String,
    pub status: OrderStatus,
    pub subtotal: Price,
    pub shipping: Price,
    pub total: Price,
    pub shipping_address: Json<serde_json::Value>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order line with its snapshots.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub product_title: String,
    pub variant_label: String,
    pub customization: Option<Json<serde_json::Value>>,
    pub quantity: i32,
    pub unit_price: Price,
    pub line_total: Price,
}

/// An order with its lines and the statuses it may move to.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub next_statuses: &'static [OrderStatus],
}

impl OrderDetail {
    #[must_use]
    pub fn new(order: Order, items: Vec<OrderItem>) -> Self {
        let next_statuses = order.status.next_statuses();
        Self {
            order,
            items,
            next_statuses,
        }
    }
}

/// One page of the order list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub status: Option<OrderStatus>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}
