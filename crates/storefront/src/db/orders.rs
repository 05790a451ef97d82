//! Orders placed by shoppers.
//!
//! Reads go through [`OrderRepository`]. The write helpers take a
//! `&mut PgConnection` so the checkout and cancel services can run them
//! inside one transaction.

use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use threadline_core::{OrderId, OrderStatus, Price, ProductId, UserId, VariantId};

use super::RepositoryError;
use crate::models::{AddressSnapshot, CustomizationSnapshot, Order, OrderDetail, OrderItem};

const ORDER_COLUMNS: &str = "id, user_id, order_number, status, subtotal, shipping, total, \
                             shipping_address, note, created_at, updated_at";

const ORDER_ITEM_COLUMNS: &str = "id, order_id, product_id, variant_id, product_title, \
                                  variant_label, customization, quantity, unit_price, line_total";

/// Repository for order reads.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM store.customer_order
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// One of the user's orders with its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_for_user(
        &self,
        user_id: UserId,
        order_number: &str,
    ) -> Result<Option<OrderDetail>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM store.customer_order WHERE order_number = $1 AND user_id = $2"
        ))
        .bind(order_number)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        let Some(order) = order else {
            return Ok(None);
        };

        let mut conn = self.pool.acquire().await?;
        let items = items(&mut conn, order.id).await?;

        Ok(Some(OrderDetail { order, items }))
    }
}

// =============================================================================
// Transaction helpers
// =============================================================================

/// A variant row locked for a stock change.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LockedVariant {
    pub id: VariantId,
    pub sku: String,
    pub stock: i32,
}

/// An order header about to be written.
#[derive(Debug, Clone)]
pub struct NewOrder<'a> {
    pub user_id: UserId,
    pub order_number: &'a str,
    pub subtotal: Price,
    pub shipping: Price,
    pub total: Price,
    pub shipping_address: &'a AddressSnapshot,
    pub note: Option<&'a str>,
}

/// An order line about to be written.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub product_title: String,
    pub variant_label: String,
    pub customization: Option<CustomizationSnapshot>,
    pub quantity: i32,
    pub unit_price: Price,
    pub line_total: Price,
}

/// Lock variant rows in ID order with `FOR UPDATE`.
pub(crate) async fn lock_variants(
    conn: &mut PgConnection,
    ids: &[VariantId],
) -> Result<Vec<LockedVariant>, RepositoryError> {
    let raw: Vec<i32> = ids.iter().map(VariantId::as_i32).collect();
    let variants = sqlx::query_as::<_, LockedVariant>(
        r"
        SELECT id, sku, stock
        FROM store.product_variant
        WHERE id = ANY($1)
        ORDER BY id
        FOR UPDATE
        ",
    )
    .bind(raw)
    .fetch_all(conn)
    .await?;

    Ok(variants)
}

/// Take `quantity` units out of stock.
pub(crate) async fn decrement_stock(
    conn: &mut PgConnection,
    variant_id: VariantId,
    quantity: i32,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE store.product_variant SET stock = stock - $2 WHERE id = $1")
        .bind(variant_id)
        .bind(quantity)
        .execute(conn)
        .await?;

    Ok(())
}

/// Insert an order header in `pending`.
pub(crate) async fn insert_order(
    conn: &mut PgConnection,
    order: &NewOrder<'_>,
) -> Result<Order, RepositoryError> {
    sqlx::query_as::<_, Order>(&format!(
        r"
        INSERT INTO store.customer_order
            (user_id, order_number, status, subtotal, shipping, total, shipping_address, note)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {ORDER_COLUMNS}
        "
    ))
    .bind(order.user_id)
    .bind(order.order_number)
    .bind(OrderStatus::Pending)
    .bind(order.subtotal)
    .bind(order.shipping)
    .bind(order.total)
    .bind(Json(order.shipping_address))
    .bind(order.note)
    .fetch_one(conn)
    .await
    .map_err(|e| RepositoryError::from_unique(e, "order number"))
}

/// Insert an order line.
pub(crate) async fn insert_item(
    conn: &mut PgConnection,
    order_id: OrderId,
    item: &NewOrderItem,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO store.customer_order_item
            (order_id, product_id, variant_id, product_title, variant_label,
             customization, quantity, unit_price, line_total)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ",
    )
    .bind(order_id)
    .bind(item.product_id)
    .bind(item.variant_id)
    .bind(&item.product_title)
    .bind(&item.variant_label)
    .bind(item.customization.as_ref().map(Json))
    .bind(item.quantity)
    .bind(item.unit_price)
    .bind(item.line_total)
    .execute(conn)
    .await?;

    Ok(())
}

/// Lines of an order.
pub(crate) async fn items(
    conn: &mut PgConnection,
    order_id: OrderId,
) -> Result<Vec<OrderItem>, RepositoryError> {
    let items = sqlx::query_as::<_, OrderItem>(&format!(
        "SELECT {ORDER_ITEM_COLUMNS} FROM store.customer_order_item WHERE order_id = $1 ORDER BY id"
    ))
    .bind(order_id)
    .fetch_all(conn)
    .await?;

    Ok(items)
}

/// Lock one of the user's orders by number.
pub(crate) async fn lock_for_user(
    conn: &mut PgConnection,
    user_id: UserId,
    order_number: &str,
) -> Result<Option<Order>, RepositoryError> {
    let order = sqlx::query_as::<_, Order>(&format!(
        r"
        SELECT {ORDER_COLUMNS}
        FROM store.customer_order
        WHERE order_number = $1 AND user_id = $2
        FOR UPDATE
        "
    ))
    .bind(order_number)
    .bind(user_id)
    .fetch_optional(conn)
    .await?;

    Ok(order)
}

/// Set an order's status.
pub(crate) async fn set_status(
    conn: &mut PgConnection,
    order_id: OrderId,
    status: OrderStatus,
) -> Result<Order, RepositoryError> {
    sqlx::query_as::<_, Order>(&format!(
        r"
        UPDATE store.customer_order
        SET status = $2, updated_at = now()
        WHERE id = $1
        RETURNING {ORDER_COLUMNS}
        "
    ))
    .bind(order_id)
    .bind(status)
    .fetch_optional(conn)
    .await?
    .ok_or(RepositoryError::NotFound)
}

/// Return an order's quantities to stock.
pub(crate) async fn restock(conn: &mut PgConnection, order_id: OrderId) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        UPDATE store.product_variant v
        SET stock = v.stock + t.quantity
        FROM (
            SELECT variant_id, SUM(quantity)::INTEGER AS quantity
            FROM store.customer_order_item
            WHERE order_id = $1
            GROUP BY variant_id
        ) t
        WHERE v.id = t.variant_id
        ",
    )
    .bind(order_id)
    .execute(conn)
    .await?;

    Ok(())
}
