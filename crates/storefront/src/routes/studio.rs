//! Customization studio route handlers.
//!
//! Designs and options are public. Saving a customization needs an
//! account; guests carry theirs in the cart as `customizationData`.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use tracing::instrument;

use threadline_core::types::color::THREAD_PALETTE;
use threadline_core::{ActionResult, CustomizationId, Placement};

use crate::db::{CustomizationRepository, DesignRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireUser;
use crate::models::{Customization, Design};
use crate::services::studio::{CustomizationRequest, SavedCustomization, create_customization};
use crate::state::AppState;

/// A named thread color.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ThreadOption {
    pub name: &'static str,
    pub hex: &'static str,
}

/// Everything the studio can offer besides designs.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudioOptions {
    pub thread_colors: Vec<ThreadOption>,
    pub placements: &'static [Placement],
}

impl StudioOptions {
    fn current() -> Self {
        Self {
            thread_colors: THREAD_PALETTE
                .iter()
                .map(|&(name, hex)| ThreadOption { name, hex })
                .collect(),
            placements: Placement::ALL,
        }
    }
}

/// Active designs.
#[instrument(skip(state))]
pub async fn designs(State(state): State<AppState>) -> Result<Json<Vec<Design>>> {
    let designs = DesignRepository::new(state.pool()).list_active().await?;
    Ok(Json(designs))
}

/// Thread palette and placements.
pub async fn options() -> Json<StudioOptions> {
    Json(StudioOptions::current())
}

/// Save a customization for the signed-in user.
#[instrument(skip(state, user, request), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(request): Json<CustomizationRequest>,
) -> Result<Json<ActionResult<SavedCustomization>>> {
    let saved = create_customization(state.pool(), user.id, &request).await?;
    add_breadcrumb("studio", "Customization saved", None);

    Ok(Json(
        ActionResult::ok_with(saved).with_message("Customization saved"),
    ))
}

/// One of the user's own customizations.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<CustomizationId>,
) -> Result<Json<Customization>> {
    CustomizationRepository::new(state.pool())
        .get(id)
        .await?
        .filter(|c| c.user_id == user.id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("customization {id}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_options_list_palette_and_placements() {
        let json = serde_json::to_value(StudioOptions::current()).unwrap();
        let colors = json["threadColors"].as_array().unwrap();
        assert_eq!(colors.len(), THREAD_PALETTE.len());
        assert!(colors.iter().all(|c| c["hex"].as_str().unwrap().starts_with('#')));

        let placements = json["placements"].as_array().unwrap();
        assert!(placements.contains(&serde_json::json!("left_chest")));
        assert!(placements.contains(&serde_json::json!("sleeve")));
    }
}
