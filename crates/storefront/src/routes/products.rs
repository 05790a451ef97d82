//! Product route handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::models::{ProductDetail, ProductPage};
use crate::state::AppState;

/// Listing query: `?q=&page=`.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    pub page: Option<u32>,
}

/// One page of the active catalog.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Arc<ProductPage>>> {
    let page = state
        .catalog()
        .page(state.pool(), query.q.as_deref(), query.page.unwrap_or(1))
        .await?;

    Ok(Json(page))
}

/// Product detail with variants and effective prices.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Arc<ProductDetail>>> {
    state
        .catalog()
        .product(state.pool(), &slug)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {slug}")))
}
