//! Access control middleware.
//!
//! Reads the access-token cookie, classifies the request path with the
//! storefront [`RoutePolicy`], and either lets the request through or
//! answers it directly:
//!
//! | Decision | GET/HEAD | Other methods |
//! |---|---|---|
//! | login | `303 /auth/login?redirect=...` | `401` "Authentication required" |
//! | refresh | `303 /auth/refresh?redirect=...` | `401` "Session expired" |
//! | home | `303 /` | `403` |
//!
//! A valid token always puts a [`CurrentUser`](threadline_core::access::CurrentUser) into the request
//! extensions, whatever the route class.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Request, State},
    http::{Method, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use tracing::Span;

use threadline_core::ActionResult;
use threadline_core::access::{AccessDecision, RoutePolicy, TokenState};
use threadline_core::auth::TokenCodec;

use super::auth::ACCESS_COOKIE;

/// Route policy plus the codec that reads access tokens.
#[derive(Debug, Clone)]
pub struct AccessControl {
    policy: Arc<RoutePolicy>,
    codec: TokenCodec,
}

impl AccessControl {
    #[must_use]
    pub fn new(policy: RoutePolicy, codec: TokenCodec) -> Self {
        Self {
            policy: Arc::new(policy),
            codec,
        }
    }

    #[must_use]
    pub fn policy(&self) -> &RoutePolicy {
        &self.policy
    }

    #[must_use]
    pub const fn codec(&self) -> &TokenCodec {
        &self.codec
    }
}

/// Enforce the route policy for every request.
pub async fn access_middleware(
    State(access): State<AccessControl>,
    mut request: Request,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(request.headers());
    let token = TokenState::from_cookie(
        access.codec(),
        jar.get(ACCESS_COOKIE).map(|c| c.value()),
        Utc::now(),
    );

    if let Some(user) = token.current_user() {
        Span::current().record("user_id", user.id.as_i32());
        request.extensions_mut().insert(user);
    }

    match access.policy().decide(request.uri().path(), &token) {
        AccessDecision::Allow => next.run(request).await,
        decision => {
            tracing::debug!(
                path = %request.uri().path(),
                ?decision,
                "Request stopped by access policy"
            );
            deny(decision, request.method(), request.uri())
        }
    }
}

/// Login page that returns to `target` afterwards.
#[must_use]
pub fn login_location(target: &str) -> String {
    format!("/auth/login?redirect={}", urlencoding::encode(target))
}

/// Turn a non-`Allow` decision into a response.
fn deny(decision: AccessDecision, method: &Method, uri: &Uri) -> Response {
    let navigation = method == Method::GET || method == Method::HEAD;

    if navigation {
        let target = uri
            .path_and_query()
            .map_or_else(|| uri.path(), |pq| pq.as_str());
        let location = match decision {
            AccessDecision::RedirectToLogin => login_location(target),
            AccessDecision::RedirectToRefresh => {
                format!("/auth/refresh?redirect={}", urlencoding::encode(target))
            }
            AccessDecision::RedirectHome | AccessDecision::Allow => "/".to_owned(),
        };
        return Redirect::to(&location).into_response();
    }

    let (status, message) = match decision {
        AccessDecision::RedirectToRefresh => (StatusCode::UNAUTHORIZED, "Session expired"),
        AccessDecision::RedirectHome | AccessDecision::Allow => {
            (StatusCode::FORBIDDEN, "Not allowed")
        }
        AccessDecision::RedirectToLogin => (StatusCode::UNAUTHORIZED, "Authentication required"),
    };
    (status, Json(ActionResult::<()>::failure(message))).into_response()
}
