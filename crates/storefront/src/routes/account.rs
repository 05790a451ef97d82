//! Account route handlers: profile, password and saved addresses.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use tracing::instrument;

use threadline_core::{ActionResult, AddressId};

use crate::db::{AddressRepository, UserRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireUser;
use crate::models::{Address, AddressInput, User};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Longest accepted display name.
const MAX_NAME_LENGTH: usize = 100;

// =============================================================================
// Request Types
// =============================================================================

/// Profile update body.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub name: Option<String>,
}

/// Password change body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordForm {
    pub current_password: String,
    pub new_password: String,
    #[serde(default)]
    pub new_password_confirm: Option<String>,
}

// =============================================================================
// Profile
// =============================================================================

/// The signed-in user's profile.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn profile(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<User>> {
    UserRepository::new(state.pool())
        .get_by_id(user.id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_owned()))
}

/// Update the display name. A blank name clears it.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(form): Json<ProfileForm>,
) -> Result<Json<ActionResult<User>>> {
    let name = form.name.as_deref().map(str::trim).filter(|n| !n.is_empty());
    if name.is_some_and(|n| n.chars().count() > MAX_NAME_LENGTH) {
        return Err(AppError::BadRequest(format!(
            "Name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }

    let updated = UserRepository::new(state.pool())
        .update_name(user.id, name)
        .await?;

    Ok(Json(ActionResult::ok_with(updated).with_message("Profile updated")))
}

/// Change the password after checking the current one.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn change_password(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(form): Json<PasswordForm>,
) -> Result<Json<ActionResult>> {
    if form
        .new_password_confirm
        .as_deref()
        .is_some_and(|confirm| confirm != form.new_password)
    {
        return Err(AppError::BadRequest("Passwords do not match".to_owned()));
    }

    AuthService::new(state.pool())
        .change_password(user.id, &form.current_password, &form.new_password)
        .await?;
    add_breadcrumb("account", "Password changed", None);

    Ok(Json(ActionResult::ok().with_message("Password changed")))
}

// =============================================================================
// Addresses
// =============================================================================

/// Saved addresses, default first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn addresses(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<Address>>> {
    let addresses = AddressRepository::new(state.pool()).list(user.id).await?;
    Ok(Json(addresses))
}

/// Save a new address. The first one becomes the default.
#[instrument(skip(state, user, input), fields(user_id = %user.id))]
pub async fn create_address(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(input): Json<AddressInput>,
) -> Result<Json<ActionResult<Address>>> {
    let input = validated(input)?;
    let address = AddressRepository::new(state.pool())
        .create(user.id, &input)
        .await?;

    Ok(Json(ActionResult::ok_with(address).with_message("Address saved")))
}

/// Replace an address's fields.
#[instrument(skip(state, user, input), fields(user_id = %user.id))]
pub async fn update_address(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<AddressId>,
    Json(input): Json<AddressInput>,
) -> Result<Json<ActionResult<Address>>> {
    let input = validated(input)?;
    let address = AddressRepository::new(state.pool())
        .update(user.id, id, &input)
        .await?;

    Ok(Json(ActionResult::ok_with(address).with_message("Address updated")))
}

/// Delete an address; a deleted default hands over to the newest remaining one.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_address(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<AddressId>,
) -> Result<Json<ActionResult>> {
    AddressRepository::new(state.pool())
        .delete(user.id, id)
        .await?;

    Ok(Json(ActionResult::ok().with_message("Address deleted")))
}

/// Make an address the default.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn set_default_address(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<AddressId>,
) -> Result<Json<ActionResult<Address>>> {
    let address = AddressRepository::new(state.pool())
        .set_default(user.id, id)
        .await?;

    Ok(Json(
        ActionResult::ok_with(address).with_message("Default address updated"),
    ))
}

fn validated(input: AddressInput) -> Result<AddressInput> {
    input
        .normalize()
        .map_err(|field| AppError::BadRequest(format!("{field} is required")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validated_names_missing_field() {
        let input: AddressInput = serde_json::from_str(
            r#"{"fullName":"Ada","line1":"1 Main St","city":"","region":"CA","postalCode":"94000","country":"US"}"#,
        )
        .unwrap();
        match validated(input).unwrap_err() {
            AppError::BadRequest(msg) => assert_eq!(msg, "city is required"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_password_form_camel_case() {
        let form: PasswordForm = serde_json::from_str(
            r#"{"currentPassword":"old-secret","newPassword":"new-secret-1"}"#,
        )
        .unwrap();
        assert_eq!(form.current_password, "old-secret");
        assert!(form.new_password_confirm.is_none());
    }
}
