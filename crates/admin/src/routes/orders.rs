//! Order management.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use threadline_core::{ActionResult, OrderStatus, is_order_number};

use crate::db::OrderRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireAdmin;
use crate::models::{OrderDetail, OrderPage};
use crate::services::orders::OrderService;
use crate::state::AppState;

/// Orders per page.
pub const ORDERS_PER_PAGE: u32 = 25;

/// `?status=&page=` for the order list.
#[derive(Debug, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub page: Option<u32>,
}

/// Status change body.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: OrderStatus,
}

/// Orders, newest first, one page at a time.
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(filter): Query<OrderFilter>,
) -> Result<Json<OrderPage>> {
    let page = filter.page.unwrap_or(1).max(1);
    let offset = i64::from(page - 1) * i64::from(ORDERS_PER_PAGE);

    let orders = OrderRepository::new(state.pool());
    let total = orders.count(filter.status).await?;
    let rows = orders
        .list(filter.status, i64::from(ORDERS_PER_PAGE), offset)
        .await?;

    Ok(Json(OrderPage {
        orders: rows,
        status: filter.status,
        page,
        per_page: ORDERS_PER_PAGE,
        total,
    }))
}

/// One order with its lines and allowed next statuses.
#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(number): Path<String>,
) -> Result<Json<OrderDetail>> {
    if !is_order_number(&number) {
        return Err(not_found(&number));
    }

    let orders = OrderRepository::new(state.pool());
    let order = orders
        .get_by_number(&number)
        .await?
        .ok_or_else(|| not_found(&number))?;
    let items = orders.items(order.id).await?;

    Ok(Json(OrderDetail::new(order, items)))
}

/// Move an order along the transition table.
#[instrument(skip(state, admin, form), fields(user_id = %admin.id, status = %form.status))]
pub async fn set_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(number): Path<String>,
    Json(form): Json<StatusForm>,
) -> Result<Json<ActionResult<OrderDetail>>> {
    if !is_order_number(&number) {
        return Err(not_found(&number));
    }

    let change = OrderService::new(state.pool())
        .change_status(&number, form.status)
        .await?;
    add_breadcrumb("orders", "Order status changed");

    let orders = OrderRepository::new(state.pool());
    let order = orders
        .get_by_number(&number)
        .await?
        .ok_or_else(|| not_found(&number))?;
    let items = orders.items(order.id).await?;

    let mut message = format!("Order {number} is now {}", change.to);
    if change.restocked {
        message.push_str("; stock returned");
    }

    Ok(Json(
        ActionResult::ok_with(OrderDetail::new(order, items)).with_message(message),
    ))
}

fn not_found(number: &str) -> AppError {
    AppError::NotFound(format!("order {number}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn filter(query: &str) -> OrderFilter {
        let uri: axum::http::Uri = format!("/admin/orders?{query}").parse().unwrap();
        Query::<OrderFilter>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn test_filter_parses_status_and_page() {
        let parsed = filter("status=processing&page=3");
        assert_eq!(parsed.status, Some(OrderStatus::Processing));
        assert_eq!(parsed.page, Some(3));
    }

    #[test]
    fn test_filter_is_optional() {
        let parsed = filter("");
        assert!(parsed.status.is_none());
        assert!(parsed.page.is_none());
    }

    #[test]
    fn test_status_form_rejects_unknown_status() {
        assert!(serde_json::from_str::<StatusForm>(r#"{"status":"lost"}"#).is_err());
    }
}
