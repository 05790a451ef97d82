//! Dashboard and console landing.

use axum::{Extension, Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use threadline_core::access::CurrentUser;

use crate::db::StatsRepository;
use crate::db::stats::DashboardStats;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Public landing. Non-admins denied elsewhere end up here, so it must
/// not redirect.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Landing {
    pub service: &'static str,
    pub signed_in: bool,
    pub is_admin: bool,
}

pub async fn landing(user: Option<Extension<CurrentUser>>) -> Json<Landing> {
    Json(Landing {
        service: "threadline-admin",
        signed_in: user.is_some(),
        is_admin: user.is_some_and(|Extension(user)| user.is_admin()),
    })
}

/// Headline counts.
#[instrument(skip(state, admin), fields(user_id = %admin.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<DashboardStats>> {
    Ok(Json(StatsRepository::new(state.pool()).dashboard().await?))
}
