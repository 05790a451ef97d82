//! Server-side carts.
//!
//! Every mutation runs in a transaction that ends with
//! [`recompute_totals`], so `cart.subtotal` and `cart.item_count` always
//! equal the sums over `cart_item`.

use sqlx::{PgConnection, PgExecutor, PgPool};

use threadline_core::{CartId, CustomizationId, Price, ProductId, UserId, VariantId};

use super::RepositoryError;
use crate::models::{CartLine, CartSummary, CartView};

const CART_COLUMNS: &str = "id, user_id, subtotal, item_count";

/// A line about to be added to a cart.
#[derive(Debug, Clone, Copy)]
pub struct NewCartLine {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub customization_id: Option<CustomizationId>,
    pub quantity: i32,
    pub unit_price: Price,
}

/// Repository for server-side carts.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the user's cart, creating an empty one on first use.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_or_create(&self, user_id: UserId) -> Result<CartSummary, RepositoryError> {
        let cart = sqlx::query_as::<_, CartSummary>(&format!(
            r"
            INSERT INTO store.cart (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING {CART_COLUMNS}
            "
        ))
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(cart)
    }

    /// The user's cart with its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn view(&self, user_id: UserId) -> Result<CartView, RepositoryError> {
        let cart = self.get_or_create(user_id).await?;
        let lines = load_lines(self.pool, cart.id).await?;
        Ok(CartView::new(cart, lines))
    }

    /// Total quantity in the user's cart; 0 if they have none yet.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn item_count(&self, user_id: UserId) -> Result<i32, RepositoryError> {
        let count = sqlx::query_scalar::<_, i32>(
            "SELECT item_count FROM store.cart WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(count.unwrap_or(0))
    }

    /// Add a line, merging with an existing line for the same variant and
    /// customization by adding quantities. The stored unit price is
    /// refreshed to the incoming one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn add_line(
        &self,
        cart_id: CartId,
        line: &NewCartLine,
    ) -> Result<CartSummary, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            INSERT INTO store.cart_item
                (cart_id, product_id, variant_id, customization_id, quantity, unit_price)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (cart_id, variant_id, customization_id)
            DO UPDATE SET quantity = store.cart_item.quantity + EXCLUDED.quantity,
                          unit_price = EXCLUDED.unit_price
            ",
        )
        .bind(cart_id)
        .bind(line.product_id)
        .bind(line.variant_id)
        .bind(line.customization_id)
        .bind(line.quantity)
        .bind(line.unit_price)
        .execute(&mut *tx)
        .await?;

        let cart = recompute_totals(&mut tx, cart_id).await?;
        tx.commit().await?;

        Ok(cart)
    }

    /// Set the quantity of a line. A quantity of zero or less removes it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such line exists.
    pub async fn set_quantity(
        &self,
        cart_id: CartId,
        variant_id: VariantId,
        customization_id: Option<CustomizationId>,
        quantity: i32,
    ) -> Result<CartSummary, RepositoryError> {
        if quantity <= 0 {
            return self.remove_line(cart_id, variant_id, customization_id).await;
        }

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r"
            UPDATE store.cart_item
            SET quantity = $4
            WHERE cart_id = $1
              AND variant_id = $2
              AND customization_id IS NOT DISTINCT FROM $3
            ",
        )
        .bind(cart_id)
        .bind(variant_id)
        .bind(customization_id)
        .bind(quantity)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        let cart = recompute_totals(&mut tx, cart_id).await?;
        tx.commit().await?;

        Ok(cart)
    }

    /// Remove a line. Removing an absent line is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn remove_line(
        &self,
        cart_id: CartId,
        variant_id: VariantId,
        customization_id: Option<CustomizationId>,
    ) -> Result<CartSummary, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            DELETE FROM store.cart_item
            WHERE cart_id = $1
              AND variant_id = $2
              AND customization_id IS NOT DISTINCT FROM $3
            ",
        )
        .bind(cart_id)
        .bind(variant_id)
        .bind(customization_id)
        .execute(&mut *tx)
        .await?;

        let cart = recompute_totals(&mut tx, cart_id).await?;
        tx.commit().await?;

        Ok(cart)
    }

    /// Remove every line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn clear(&self, cart_id: CartId) -> Result<CartSummary, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let cart = clear_lines(&mut tx, cart_id).await?;
        tx.commit().await?;
        Ok(cart)
    }
}

/// Lines of a cart joined with catalog and customization data.
pub(crate) async fn load_lines<'e, E>(
    executor: E,
    cart_id: CartId,
) -> Result<Vec<CartLine>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let lines = sqlx::query_as::<_, CartLine>(
        r"
        SELECT ci.id, ci.product_id,
               p.slug AS product_slug, p.title AS product_title, p.status AS product_status,
               ci.variant_id, v.sku, v.size, v.color, v.stock,
               ci.customization_id, c.design_id, d.name AS design_name,
               c.thread_color_hex, c.position,
               ci.quantity, ci.unit_price,
               (ci.unit_price * ci.quantity)::NUMERIC(10, 2) AS line_total
        FROM store.cart_item ci
        JOIN store.product p ON p.id = ci.product_id
        JOIN store.product_variant v ON v.id = ci.variant_id
        LEFT JOIN store.customization c ON c.id = ci.customization_id
        LEFT JOIN store.design d ON d.id = c.design_id
        WHERE ci.cart_id = $1
        ORDER BY ci.created_at, ci.id
        ",
    )
    .bind(cart_id)
    .fetch_all(executor)
    .await?;

    Ok(lines)
}

/// Delete all lines of a cart and reset its totals.
pub(crate) async fn clear_lines(
    conn: &mut PgConnection,
    cart_id: CartId,
) -> Result<CartSummary, RepositoryError> {
    sqlx::query("DELETE FROM store.cart_item WHERE cart_id = $1")
        .bind(cart_id)
        .execute(&mut *conn)
        .await?;

    recompute_totals(conn, cart_id).await
}

/// Recompute `subtotal` and `item_count` from the cart's lines.
pub(crate) async fn recompute_totals(
    conn: &mut PgConnection,
    cart_id: CartId,
) -> Result<CartSummary, RepositoryError> {
    let cart = sqlx::query_as::<_, CartSummary>(
        r"
        UPDATE store.cart c
        SET subtotal = COALESCE(t.subtotal, 0),
            item_count = COALESCE(t.item_count, 0),
            updated_at = now()
        FROM (
            SELECT SUM(unit_price * quantity) AS subtotal, SUM(quantity)::INTEGER AS item_count
            FROM store.cart_item
            WHERE cart_id = $1
        ) t
        WHERE c.id = $1
        RETURNING c.id, c.user_id, c.subtotal, c.item_count
        ",
    )
    .bind(cart_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(RepositoryError::NotFound)?;

    Ok(cart)
}
