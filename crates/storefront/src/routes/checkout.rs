//! Checkout route handlers.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use threadline_core::{ActionResult, AddressId};

use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireUser;
use crate::models::OrderDetail;
use crate::services::checkout::{CheckoutService, CheckoutSummary};
use crate::state::AppState;

/// Place-order body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderForm {
    pub address_id: AddressId,
    #[serde(default)]
    pub note: Option<String>,
}

/// Cart, addresses and the shipping quote.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn summary(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<CheckoutSummary>> {
    let summary = CheckoutService::new(state.pool(), state.config().shipping)
        .summary(user.id)
        .await?;

    Ok(Json(summary))
}

/// Turn the cart into a pending order.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn place_order(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(form): Json<PlaceOrderForm>,
) -> Result<Json<ActionResult<OrderDetail>>> {
    let order = CheckoutService::new(state.pool(), state.config().shipping)
        .place_order(user.id, form.address_id, form.note.as_deref())
        .await?;

    add_breadcrumb(
        "checkout",
        "Order placed",
        Some(&[("order_number", order.order.order_number.as_str())]),
    );

    let message = format!("Order {} placed", order.order.order_number);
    Ok(Json(ActionResult::ok_with(order).with_message(message)))
}
