//! Embroidery design management.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use threadline_core::{ActionResult, DesignId};

use crate::db::DesignRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{Design, DesignInput};
use crate::state::AppState;

/// Every design, including inactive ones.
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<Design>>> {
    Ok(Json(DesignRepository::new(state.pool()).list().await?))
}

/// Create a design.
#[instrument(skip(state, admin, input), fields(user_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<DesignInput>,
) -> Result<Json<ActionResult<Design>>> {
    input.validate().map_err(AppError::BadRequest)?;
    let design = DesignRepository::new(state.pool()).create(&input).await?;
    Ok(Json(ActionResult::ok_with(design).with_message("Design created")))
}

/// Replace a design. Deactivating hides it from the studio; saved
/// customizations keep pointing at it.
#[instrument(skip(state, admin, input), fields(user_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DesignId>,
    Json(input): Json<DesignInput>,
) -> Result<Json<ActionResult<Design>>> {
    input.validate().map_err(AppError::BadRequest)?;
    let design = DesignRepository::new(state.pool())
        .update(id, &input)
        .await?;
    Ok(Json(ActionResult::ok_with(design).with_message("Design saved")))
}
