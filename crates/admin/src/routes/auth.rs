//! Console sign-in.

use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use threadline_core::ActionResult;
use threadline_core::access::sanitize_redirect;

use crate::error::{Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::middleware::{
    REFRESH_COOKIE, clear_session_cookies, login_location, set_access_cookie, set_session_cookies,
};
use crate::models::AdminUser;
use crate::services::auth::{AuthService, issue_access_token, issue_tokens};
use crate::state::AppState;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// `?redirect=` carried through login and refresh.
#[derive(Debug, Deserialize)]
pub struct RedirectQuery {
    pub redirect: Option<String>,
}

/// Where the login form sends the admin afterwards.
#[derive(Debug, Serialize)]
pub struct LoginPage {
    pub redirect: String,
}

/// Result of a successful sign-in.
#[derive(Debug, Serialize)]
pub struct SignedIn {
    pub user: AdminUser,
    pub redirect: String,
}

/// Login form metadata. Defaults the target to the dashboard.
pub async fn login_page(Query(query): Query<RedirectQuery>) -> Json<LoginPage> {
    Json(LoginPage {
        redirect: admin_target(query.redirect.as_deref()),
    })
}

/// Sign in. Valid credentials for a non-admin account are refused.
#[instrument(skip(state, jar, form))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<RedirectQuery>,
    Json(form): Json<LoginForm>,
) -> Result<(CookieJar, Json<ActionResult<SignedIn>>)> {
    let user = AuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "Console login failed"))?;

    let tokens = issue_tokens(state.codec(), &state.config().auth, &user, Utc::now())?;

    set_sentry_user(&user.id, Some(user.email.as_str()));
    add_breadcrumb("auth", "Admin signed in");
    tracing::info!(user_id = %user.id, "Admin signed in");

    let jar = set_session_cookies(jar, &tokens, state.config());
    let signed_in = SignedIn {
        user,
        redirect: admin_target(query.redirect.as_deref()),
    };
    Ok((jar, Json(ActionResult::ok_with(signed_in))))
}

/// Recover from an expired access token.
#[instrument(skip(state, jar))]
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<RedirectQuery>,
) -> Response {
    let target = admin_target(query.redirect.as_deref());
    let Some(token) = jar.get(REFRESH_COOKIE).map(|c| c.value().to_owned()) else {
        return (clear_session_cookies(jar), Redirect::to(&login_location(&target)))
            .into_response();
    };

    let now = Utc::now();
    let refreshed = AuthService::new(state.pool())
        .refresh(state.codec(), &token, now)
        .await
        .and_then(|user| issue_access_token(state.codec(), &state.config().auth, &user, now));

    match refreshed {
        Ok(access) => (
            set_access_cookie(jar, &access, state.config()),
            Redirect::to(&target),
        )
            .into_response(),
        Err(e) => {
            tracing::info!(error = %e, "Console token refresh failed");
            (clear_session_cookies(jar), Redirect::to(&login_location(&target))).into_response()
        }
    }
}

/// Sign out.
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<ActionResult>) {
    clear_sentry_user();
    (
        clear_session_cookies(jar),
        Json(ActionResult::ok().with_message("Signed out")),
    )
}

/// Sanitized redirect target; a bare `/` means the dashboard.
fn admin_target(redirect: Option<&str>) -> String {
    match sanitize_redirect(redirect) {
        target if target == "/" => "/admin".to_owned(),
        target => target,
    }
}
