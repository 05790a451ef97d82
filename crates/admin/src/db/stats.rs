//! Dashboard counters.

use serde::Serialize;
use sqlx::PgPool;

use threadline_core::Price;

use super::RepositoryError;

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub active_products: i64,
    pub draft_products: i64,
    pub low_stock_variants: i64,
    pub pending_orders: i64,
    pub open_orders: i64,
    pub customers: i64,
    /// Total of orders that were not cancelled or refunded.
    pub revenue: Price,
}

/// A variant counts as low on stock at or below this many units.
pub const LOW_STOCK_THRESHOLD: i32 = 5;

/// Repository for aggregate reads.
pub struct StatsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StatsRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Compute the dashboard counters in one round trip.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn dashboard(&self) -> Result<DashboardStats, RepositoryError> {
        let stats = sqlx::query_as::<_, DashboardStats>(
            r"
            SELECT
                (SELECT COUNT(*) FROM store.product WHERE status = 'active') AS active_products,
                (SELECT COUNT(*) FROM store.product WHERE status = 'draft') AS draft_products,
                (SELECT COUNT(*) FROM store.product_variant WHERE stock <= $1) AS low_stock_variants,
                (SELECT COUNT(*) FROM store.customer_order WHERE status = 'pending') AS pending_orders,
                (SELECT COUNT(*) FROM store.customer_order
                  WHERE status IN ('paid', 'processing')) AS open_orders,
                (SELECT COUNT(*) FROM store.user WHERE role = 'customer') AS customers,
                (SELECT COALESCE(SUM(total), 0) FROM store.customer_order
                  WHERE status NOT IN ('cancelled', 'refunded')) AS revenue
            ",
        )
        .bind(LOW_STOCK_THRESHOLD)
        .fetch_one(self.pool)
        .await?;

        Ok(stats)
    }
}
