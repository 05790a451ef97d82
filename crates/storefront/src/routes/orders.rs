//! Order history route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use threadline_core::{ActionResult, is_order_number};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::{Order, OrderDetail};
use crate::services::orders::cancel_order;
use crate::state::AppState;

/// The user's orders, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;

    Ok(Json(orders))
}

/// One of the user's orders with its lines.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(number): Path<String>,
) -> Result<Json<OrderDetail>> {
    if !is_order_number(&number) {
        return Err(not_found(&number));
    }

    OrderRepository::new(state.pool())
        .get_for_user(user.id, &number)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(&number))
}

/// Cancel a pending order and return its stock.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(number): Path<String>,
) -> Result<Json<ActionResult<Order>>> {
    if !is_order_number(&number) {
        return Err(not_found(&number));
    }

    let order = cancel_order(state.pool(), user.id, &number).await?;
    Ok(Json(
        ActionResult::ok_with(order).with_message("Order cancelled"),
    ))
}

fn not_found(number: &str) -> AppError {
    AppError::NotFound(format!("order {number}"))
}
