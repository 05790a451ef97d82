//! Order status changes.

use sqlx::PgPool;
use thiserror::Error;

use threadline_core::OrderStatus;

use crate::db::RepositoryError;
use crate::db::orders::{lock_order, restock, set_status};

/// Errors from changing an order.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order not found")]
    NotFound,

    #[error("Cannot move an order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for OrderError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

/// What a status change did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub restocked: bool,
}

/// Whether moving `from` -> `to` puts stock back on the shelf.
///
/// Cancelling or refunding returns the goods unless they already left the
/// warehouse.
#[must_use]
pub const fn restocks(from: OrderStatus, to: OrderStatus) -> bool {
    matches!(to, OrderStatus::Cancelled | OrderStatus::Refunded) && !from.has_shipped()
}

/// Order status service.
pub struct OrderService<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Move an order to `next` along the transition table, restocking
    /// unshipped cancellations and refunds.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if no order has that number.
    /// Returns `OrderError::InvalidTransition` if the table forbids the move.
    pub async fn change_status(
        &self,
        order_number: &str,
        next: OrderStatus,
    ) -> Result<StatusChange, OrderError> {
        let mut tx = self.pool.begin().await?;

        let (order_id, current) = lock_order(&mut tx, order_number)
            .await?
            .ok_or(OrderError::NotFound)?;

        if !current.can_transition_to(next) {
            return Err(OrderError::InvalidTransition {
                from: current,
                to: next,
            });
        }

        let restocked = restocks(current, next);
        if restocked {
            restock(&mut tx, order_id).await?;
        }
        set_status(&mut tx, order_id, next).await?;

        tx.commit().await?;

        tracing::info!(
            order_number,
            from = %current,
            to = %next,
            restocked,
            "Order status changed"
        );

        Ok(StatusChange {
            from: current,
            to: next,
            restocked,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restocks_unshipped_cancellations() {
        assert!(restocks(OrderStatus::Pending, OrderStatus::Cancelled));
        assert!(restocks(OrderStatus::Paid, OrderStatus::Cancelled));
        assert!(restocks(OrderStatus::Processing, OrderStatus::Cancelled));
        assert!(!restocks(OrderStatus::Shipped, OrderStatus::Cancelled));
    }

    #[test]
    fn test_restocks_unshipped_refunds() {
        assert!(restocks(OrderStatus::Paid, OrderStatus::Refunded));
        assert!(restocks(OrderStatus::Processing, OrderStatus::Refunded));
        assert!(!restocks(OrderStatus::Shipped, OrderStatus::Refunded));
        assert!(!restocks(OrderStatus::Delivered, OrderStatus::Refunded));
    }

    #[test]
    fn test_forward_moves_never_restock() {
        assert!(!restocks(OrderStatus::Pending, OrderStatus::Paid));
        assert!(!restocks(OrderStatus::Processing, OrderStatus::Shipped));
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = OrderError::InvalidTransition {
            from: OrderStatus::Shipped,
            to: OrderStatus::Cancelled,
        };
        assert_eq!(err.to_string(), "Cannot move an order from shipped to cancelled");
    }
}
