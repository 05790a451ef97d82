//! HTTP route handlers for the admin console.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                                - Landing (public)
//! GET  /health, /health/ready
//!
//! # Auth
//! GET  /auth/login, POST /auth/login    - Sign in (guests only)
//! GET  /auth/refresh?redirect=          - Expired-token recovery
//! POST /auth/logout
//!
//! # Console (admin)
//! GET  /admin                           - Dashboard counts
//! GET  /admin/products?status=, POST /admin/products
//! GET  /admin/products/{id}, POST /admin/products/{id}
//! POST /admin/products/{id}/status, /admin/products/{id}/delete
//! POST /admin/products/{id}/variants
//! POST /admin/variants/{id}, /admin/variants/{id}/delete
//! GET  /admin/designs, POST /admin/designs, POST /admin/designs/{id}
//! GET  /admin/orders?status=&page=, /admin/orders/{number}
//! POST /admin/orders/{number}/status
//! GET  /admin/users, POST /admin/users/{id}/role
//! GET  /admin/content, POST /admin/content/{key}, /admin/content/{key}/delete
//! ```

pub mod auth;
pub mod content;
pub mod dashboard;
pub mod designs;
pub mod health;
pub mod orders;
pub mod products;
pub mod users;

use std::time::Duration;

use axum::{
    Router,
    http::{Request, Response},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::{
    access_middleware, auth_rate_limiter, request_id_middleware, security_headers_middleware,
};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/refresh", get(auth::refresh))
        .route("/logout", post(auth::logout))
        .layer(auth_rate_limiter())
}

/// Create the `/admin` router.
pub fn console_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .route("/products", get(products::index).post(products::create))
        .route("/products/{id}", get(products::show).post(products::update))
        .route("/products/{id}/status", post(products::set_status))
        .route("/products/{id}/delete", post(products::delete))
        .route("/products/{id}/variants", post(products::add_variant))
        .route("/variants/{id}", post(products::update_variant))
        .route("/variants/{id}/delete", post(products::delete_variant))
        .route("/designs", get(designs::index).post(designs::create))
        .route("/designs/{id}", post(designs::update))
        .route("/orders", get(orders::index))
        .route("/orders/{number}", get(orders::show))
        .route("/orders/{number}/status", post(orders::set_status))
        .route("/users", get(users::index))
        .route("/users/{id}/role", post(users::set_role))
        .route("/content", get(content::index))
        .route("/content/{key}", post(content::upsert))
        .route("/content/{key}/delete", post(content::delete))
}

/// Create all routes for the admin console.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::landing))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/auth", auth_routes())
        .nest("/admin", console_routes())
}

/// The console application with its middleware stack, minus Sentry.
///
/// Layers run outermost first: trace, request ID, security headers,
/// access control.
pub fn app(state: AppState) -> Router {
    let access = state.access().clone();

    routes()
        .layer(from_fn_with_state(access, access_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{StatusCode, header};
    use chrono::Utc;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use threadline_core::auth::{Claims, TokenKind};
    use threadline_core::{Role, UserId};

    use super::*;
    use crate::config::test_config;
    use crate::middleware::ACCESS_COOKIE;

    fn test_app() -> (Router, AppState) {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/threadline_test")
            .unwrap();
        let state = AppState::new(test_config(), pool);
        (app(state.clone()), state)
    }

    fn access_cookie(state: &AppState, role: Role) -> String {
        let claims = Claims::new(
            UserId::new(7),
            "ops@threadline.test",
            role,
            TokenKind::Access,
            Utc::now(),
            chrono::Duration::minutes(15),
        );
        format!("{ACCESS_COOKIE}={}", state.codec().issue(&claims).unwrap())
    }

    async fn json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_has_security_headers() {
        let (app, _) = test_app();
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(response.headers()[header::X_FRAME_OPTIONS], "DENY");
    }

    #[tokio::test]
    async fn test_guest_is_sent_to_login_with_target() {
        let (app, _) = test_app();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/admin/orders?status=paid")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/auth/login?redirect=%2Fadmin%2Forders%3Fstatus%3Dpaid"
        );
    }

    #[tokio::test]
    async fn test_customer_lands_on_public_home() {
        let (app, state) = test_app();
        let cookie = access_cookie(&state, Role::Customer);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/admin")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["signedIn"], true);
        assert_eq!(body["isAdmin"], false);
    }

    #[tokio::test]
    async fn test_customer_post_is_forbidden() {
        let (app, state) = test_app();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/admin/orders/TL-20260309-9F3B1C2A/status")
                    .header(header::COOKIE, access_cookie(&state, Role::Customer))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"status":"paid"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(json(response).await["message"], "Admin access required");
    }

    #[tokio::test]
    async fn test_admin_is_sent_from_login_to_home() {
        let (app, state) = test_app();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/auth/login")
                    .header("x-real-ip", "203.0.113.7")
                    .header(header::COOKIE, access_cookie(&state, Role::Admin))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
    }

    #[tokio::test]
    async fn test_login_page_defaults_to_dashboard() {
        let (app, _) = test_app();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/auth/login")
                    .header("x-real-ip", "203.0.113.8")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["redirect"], "/admin");
    }
}
