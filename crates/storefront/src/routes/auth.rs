//! Authentication route handlers.
//!
//! Password login and registration set the access/refresh cookie pair.
//! Signing in keeps the session's guest cart so the client can export it;
//! signing out drops it.

use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use threadline_core::ActionResult;
use threadline_core::access::sanitize_redirect;
use threadline_core::auth::MIN_PASSWORD_LENGTH;

use crate::error::{AppError, Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::middleware::{
    REFRESH_COOKIE, clear_session_cookies, discard_guest_cart, login_location, set_access_cookie,
    set_session_cookies,
};
use crate::models::User;
use crate::services::auth::{AuthService, issue_access_token, issue_tokens};
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub password_confirm: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// `?redirect=` carried through the auth pages.
#[derive(Debug, Deserialize)]
pub struct RedirectQuery {
    pub redirect: Option<String>,
}

// =============================================================================
// Response Types
// =============================================================================

/// What a login or registration form needs to render.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthFormMeta {
    pub min_password_length: usize,
    pub redirect: String,
}

/// Result of a successful sign-in.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedIn {
    pub user: User,
    /// Same-site path the client should continue to.
    pub redirect: String,
}

// =============================================================================
// Login & Registration
// =============================================================================

/// Login form metadata.
pub async fn login_page(Query(query): Query<RedirectQuery>) -> Json<AuthFormMeta> {
    Json(form_meta(query.redirect.as_deref()))
}

/// Registration form metadata.
pub async fn register_page(Query(query): Query<RedirectQuery>) -> Json<AuthFormMeta> {
    Json(form_meta(query.redirect.as_deref()))
}

/// Handle login form submission.
#[instrument(skip(state, session, jar, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
    Query(query): Query<RedirectQuery>,
    Json(form): Json<LoginForm>,
) -> Result<(CookieJar, Json<ActionResult<SignedIn>>)> {
    let user = AuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await
        .inspect_err(|e| tracing::info!(error = %e, "Login failed"))?;

    sign_in(&state, &session, jar, user, query.redirect.as_deref()).await
}

/// Handle registration form submission. The new account is signed in.
#[instrument(skip(state, session, jar, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
    Query(query): Query<RedirectQuery>,
    Json(form): Json<RegisterForm>,
) -> Result<(CookieJar, Json<ActionResult<SignedIn>>)> {
    if form
        .password_confirm
        .as_deref()
        .is_some_and(|confirm| confirm != form.password)
    {
        return Err(AppError::BadRequest("Passwords do not match".to_owned()));
    }

    let user = AuthService::new(state.pool())
        .register(&form.email, &form.password, form.name.as_deref())
        .await?;
    tracing::info!(user_id = %user.id, "Account registered");

    sign_in(&state, &session, jar, user, query.redirect.as_deref()).await
}

/// Issue cookies for `user`. The session id is cycled; its guest cart stays
/// until the client exports and discards it, or signs out.
async fn sign_in(
    state: &AppState,
    session: &Session,
    jar: CookieJar,
    user: User,
    redirect: Option<&str>,
) -> Result<(CookieJar, Json<ActionResult<SignedIn>>)> {
    let tokens = issue_tokens(state.codec(), &state.config().auth, &user, Utc::now())?;

    session.cycle_id().await?;

    set_sentry_user(&user.id, Some(user.email.as_str()));
    add_breadcrumb("auth", "Signed in", None);
    tracing::info!(user_id = %user.id, "User signed in");

    let jar = set_session_cookies(jar, &tokens, state.config());
    let signed_in = SignedIn {
        user,
        redirect: sanitize_redirect(redirect),
    };
    Ok((jar, Json(ActionResult::ok_with(signed_in))))
}

// =============================================================================
// Refresh & Logout
// =============================================================================

/// Recover from an expired access token.
///
/// A valid refresh cookie gets a new access cookie and a redirect to the
/// sanitized target; anything else clears both cookies and goes to login.
#[instrument(skip(state, jar))]
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<RedirectQuery>,
) -> Response {
    let target = sanitize_redirect(query.redirect.as_deref());
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
            tracing::info!(error = %e, "Token refresh failed");
            (clear_session_cookies(jar), Redirect::to(&login_location(&target))).into_response()
        }
    }
}

/// Sign out: clear the cookies and the session.
#[instrument(skip(session, jar))]
pub async fn logout(session: Session, jar: CookieJar) -> Result<(CookieJar, Json<ActionResult>)> {
    discard_guest_cart(&session).await?;
    session.flush().await?;
    clear_sentry_user();

    Ok((
        clear_session_cookies(jar),
        Json(ActionResult::ok().with_message("Signed out")),
    ))
}

fn form_meta(redirect: Option<&str>) -> AuthFormMeta {
    AuthFormMeta {
        min_password_length: MIN_PASSWORD_LENGTH,
        redirect: sanitize_redirect(redirect),
    }
}
