//! Read-only content blocks managed from the admin console.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use threadline_core::ContentKey;

use crate::db::SettingsRepository;
use crate::db::settings::ContentBlock;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Serve one content block.
///
/// Keys that could never be stored are answered with 404 without a query.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ContentBlock>> {
    let not_found = || AppError::NotFound(format!("content {key}"));
    let content_key = ContentKey::parse(&key).map_err(|_| not_found())?;

    SettingsRepository::new(state.pool())
        .get(&content_key)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}
