//! Customer-side order changes.

use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use threadline_core::{OrderStatus, UserId};

use crate::db::RepositoryError;
use crate::db::orders;
use crate::models::Order;

/// Errors from order changes.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("order not found")]
    NotFound,

    #[error("a {0} order cannot be cancelled")]
    NotCancellable(OrderStatus),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for OrderError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

/// Cancel one of the user's `pending` orders and return its stock.
///
/// # Errors
///
/// Returns `OrderError::NotFound` if the user has no such order and
/// `OrderError::NotCancellable` if it is past `pending`.
#[instrument(skip(pool))]
pub async fn cancel_order(
    pool: &PgPool,
    user_id: UserId,
    order_number: &str,
) -> Result<Order, OrderError> {
    let mut tx = pool.begin().await?;

    let order = orders::lock_for_user(&mut tx, user_id, order_number)
        .await?
        .ok_or(OrderError::NotFound)?;

    if order.status != OrderStatus::Pending {
        return Err(OrderError::NotCancellable(order.status));
    }

    let order = orders::set_status(&mut tx, order.id, OrderStatus::Cancelled).await?;
    orders::restock(&mut tx, order.id).await?;

    tx.commit().await?;

    tracing::info!(order_number = %order.order_number, "Order cancelled by customer");
    Ok(order)
}
