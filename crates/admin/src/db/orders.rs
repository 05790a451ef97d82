//! Order administration.

use sqlx::{PgConnection, PgPool};

use threadline_core::{OrderId, OrderStatus};

use super::RepositoryError;
use crate::models::{Order, OrderItem};

const ORDER_COLUMNS: &str = "o.id, o.user_id, u.email AS customer_email, o.order_number, o.status, \
                             o.subtotal, o.shipping, o.total, o.shipping_address, o.note, \
                             o.created_at, o.updated_at";

const ITEM_COLUMNS: &str = "id, product_id, variant_id, product_title, variant_label, \
                            customization, quantity, unit_price, line_total";

/// Repository for order reads.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Orders newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        status: Option<OrderStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM store.customer_order o
            JOIN store.user u ON u.id = o.user_id
            WHERE ($1::store.order_status IS NULL OR o.status = $1)
            ORDER BY o.created_at DESC, o.id DESC
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// Count orders matching the same filter as [`Self::list`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, status: Option<OrderStatus>) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            r"
            SELECT COUNT(*) FROM store.customer_order
            WHERE ($1::store.order_status IS NULL OR status = $1)
            ",
        )
        .bind(status)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// Get an order by its number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_number(&self, order_number: &str) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM store.customer_order o
            JOIN store.user u ON u.id = o.user_id
            WHERE o.order_number = $1
            "
        ))
        .bind(order_number)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// Lines of an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM store.customer_order_item WHERE order_id = $1 ORDER BY id"
        ))
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }
}

// =============================================================================
// Transaction helpers
// =============================================================================

/// Lock an order row by number and return its ID and status.
pub(crate) async fn lock_order(
    conn: &mut PgConnection,
    order_number: &str,
) -> Result<Option<(OrderId, OrderStatus)>, RepositoryError> {
    let row = sqlx::query_as::<_, (OrderId, OrderStatus)>(
        "SELECT id, status FROM store.customer_order WHERE order_number = $1 FOR UPDATE",
    )
    .bind(order_number)
    .fetch_optional(conn)
    .await?;

    Ok(row)
}

/// Set an order's status.
pub(crate) async fn set_status(
    conn: &mut PgConnection,
    order_id: OrderId,
    status: OrderStatus,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE store.customer_order SET status = $2, updated_at = now() WHERE id = $1")
        .bind(order_id)
        .bind(status)
        .execute(conn)
        .await?;

    Ok(())
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
