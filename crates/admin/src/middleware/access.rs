//! Access control middleware for the console.
//!
//! Everything under `/admin` needs an admin token. Signed-in customers who
//! wander in are sent to `/`; guests go to login, and an expired token
//! goes through `/auth/refresh` first.

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
    pub const fn codec(&self) -> &TokenCodec {
        &self.codec
    }
}

/// Enforce the console route policy for every request.
pub async fn access_middleware(
    State(access): State<AccessControl>,
    mut request: Request,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(request.headers());
    let token = TokenState::from_cookie(
        &access.codec,
        jar.get(ACCESS_COOKIE).map(|c| c.value()),
        Utc::now(),
    );

    if let Some(user) = token.current_user() {
        Span::current().record("user_id", user.id.as_i32());
        request.extensions_mut().insert(user);
    }

    match access.policy.decide(request.uri().path(), &token) {
        AccessDecision::Allow => next.run(request).await,
        decision => {
            tracing::info!(
                path = %request.uri().path(),
                ?decision,
                "Console request stopped by access policy"
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

fn deny(decision: AccessDecision, method: &Method, uri: &Uri) -> Response {
    if method == Method::GET || method == Method::HEAD {
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
        AccessDecision::RedirectToLogin => (StatusCode::UNAUTHORIZED, "Authentication required"),
        AccessDecision::RedirectToRefresh => (StatusCode::UNAUTHORIZED, "Session expired"),
        AccessDecision::RedirectHome | AccessDecision::Allow => {
            (StatusCode::FORBIDDEN, "Admin access required")
        }
    };
    (status, Json(ActionResult::<()>::failure(message))).into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{Router, body::Body, http::header, routing::get};
    use chrono::Duration;
    use threadline_core::auth::{Claims, TokenKind};
    use threadline_core::{Role, UserId};
    use tower::ServiceExt;

    use super::*;

    const SECRET: &[u8] = b"kP9$wq2!Lz7@Rm4#Xt8&Bv1*Nc6^Hs3%";

    fn app() -> Router {
        let access = AccessControl::new(RoutePolicy::admin_console(), TokenCodec::new(SECRET));
        Router::new()
            .route("/", get(|| async { "console" }))
            .route("/admin/orders", get(|| async { "orders" }).post(|| async { "changed" }))
            .route("/auth/login", get(|| async { "login form" }))
            .layer(axum::middleware::from_fn_with_state(access, access_middleware))
    }

    fn cookie(role: Role) -> String {
        let claims = Claims::new(
            UserId::new(9),
            "ops@threadline.test",
            role,
            TokenKind::Access,
            Utc::now(),
            Duration::minutes(15),
        );
        let token = TokenCodec::new(SECRET).issue(&claims).unwrap();
        format!("{ACCESS_COOKIE}={token}")
    }

    fn get_with(uri: &str, cookie: Option<&str>) -> Request {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_admin_reaches_console() {
        let response = app()
            .oneshot(get_with("/admin/orders", Some(&cookie(Role::Admin))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_customer_sent_home() {
        let response = app()
            .oneshot(get_with("/admin/orders", Some(&cookie(Role::Customer))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
    }

    #[tokio::test]
    async fn test_customer_mutation_forbidden() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/admin/orders")
            .header(header::COOKIE, cookie(Role::Customer))
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_guest_sent_to_login() {
        let response = app().oneshot(get_with("/admin/orders", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/auth/login?redirect=%2Fadmin%2Forders"
        );
    }

    #[tokio::test]
    async fn test_storefront_cookie_is_ignored() {
        let storefront = cookie(Role::Admin).replacen(ACCESS_COOKIE, "tl_access", 1);
        let response = app()
            .oneshot(get_with("/admin/orders", Some(&storefront)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(
            response.headers()[header::LOCATION]
                .to_str()
                .unwrap()
                .starts_with("/auth/login")
        );
    }
}
