//! Account administration.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use tracing::instrument;

use threadline_core::{ActionResult, Role, UserId};

use crate::db::UserRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireAdmin;
use crate::models::UserSummary;
use crate::state::AppState;

/// Role change body.
#[derive(Debug, Deserialize)]
pub struct RoleForm {
    pub role: Role,
}

/// Every account with its order count.
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<UserSummary>>> {
    Ok(Json(UserRepository::new(state.pool()).list().await?))
}

/// Promote or demote an account. Admins cannot change their own role.
#[instrument(skip(state, admin, form), fields(user_id = %admin.id, target_user_id = %id, role = %form.role))]
pub async fn set_role(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
    Json(form): Json<RoleForm>,
) -> Result<Json<ActionResult>> {
    if id == admin.id {
        return Err(AppError::BadRequest(
            "You cannot change your own role".to_owned(),
        ));
    }

    UserRepository::new(state.pool()).set_role(id, form.role).await?;
    add_breadcrumb("users", "Role changed");
    tracing::info!(target_user_id = %id, role = %form.role, "Role changed");

    Ok(Json(
        ActionResult::ok().with_message(format!("Account is now {}", form.role)),
    ))
}
