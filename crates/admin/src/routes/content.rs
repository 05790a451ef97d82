//! Content block administration.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use threadline_core::{ActionResult, ContentKey};

use crate::db::{ContentRepository, content::ContentBlock};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// All blocks by key.
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<ContentBlock>>> {
    Ok(Json(ContentRepository::new(state.pool()).list().await?))
}

/// Create or replace a block. The body is stored as-is.
#[instrument(skip(state, admin, value), fields(user_id = %admin.id))]
pub async fn upsert(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(key): Path<String>,
    Json(value): Json<serde_json::Value>,
) -> Result<Json<ActionResult<ContentBlock>>> {
    let key = parse_key(&key)?;
    let block = ContentRepository::new(state.pool())
        .upsert(&key, &value)
        .await?;

    Ok(Json(ActionResult::ok_with(block).with_message("Content saved")))
}

/// Delete a block.
#[instrument(skip(state, admin), fields(user_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(key): Path<String>,
) -> Result<Json<ActionResult>> {
    let key = parse_key(&key)?;
    ContentRepository::new(state.pool()).delete(&key).await?;
    Ok(Json(ActionResult::ok().with_message("Content deleted")))
}

fn parse_key(raw: &str) -> Result<ContentKey> {
    ContentKey::parse(raw).map_err(|_| {
        AppError::BadRequest(
            "Content keys use lowercase letters, digits and dashes (max 64)".to_owned(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key() {
        assert!(parse_key("home-hero").is_ok());
        assert!(matches!(parse_key("Home Hero"), Err(AppError::BadRequest(_))));
        assert!(matches!(parse_key(""), Err(AppError::BadRequest(_))));
    }
}
