//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health, /health/ready
//! GET  /content/{key}                  - Content block
//!
//! # Catalog
//! GET  /products?q=&page=              - Active product listing
//! GET  /products/{slug}                - Product detail
//!
//! # Cart (account cart when signed in, session cart otherwise)
//! GET  /cart
//! POST /cart/add, /cart/update, /cart/remove, /cart/clear
//! GET  /cart/count
//! GET  /cart/export                    - Session guest cart items (kept across sign-in)
//! POST /cart/export/discard            - Drop them once synced
//!
//! # Studio
//! GET  /studio/designs, /studio/options
//! POST /studio/customizations          - Save a customization (auth)
//! GET  /studio/customizations/{id}     - (auth)
//!
//! # Wishlist (auth)
//! GET  /wishlist
//! POST /wishlist/add, /wishlist/remove, /wishlist/toggle, /wishlist/move-to-cart
//!
//! # Account (auth)
//! GET  /account
//! POST /account/profile, /account/password
//! GET  /account/addresses, POST /account/addresses
//! POST /account/addresses/{id}, /account/addresses/{id}/delete, /account/addresses/{id}/default
//!
//! # Checkout & orders (auth)
//! GET  /checkout, POST /checkout
//! GET  /orders, /orders/{number}
//! POST /orders/{number}/cancel
//!
//! # Auth
//! GET  /auth/login, /auth/register     - Form metadata (guests only)
//! POST /auth/login, /auth/register     - Sign in
//! GET  /auth/refresh?redirect=         - Expired-token recovery
//! POST /auth/logout
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod content;
pub mod health;
pub mod orders;
pub mod products;
pub mod studio;
pub mod wishlist;

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
    access_middleware, auth_rate_limiter, cart_rate_limiter, create_session_layer,
    request_id_middleware, security_headers_middleware,
};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/refresh", get(auth::refresh))
        .route("/logout", post(auth::logout))
        .layer(auth_rate_limiter())
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{slug}", get(products::show))
}

/// Create the cart routes router. Mutations are rate limited.
pub fn cart_routes() -> Router<AppState> {
    let mutations = Router::new()
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/export/discard", post(cart::discard_export))
        .layer(cart_rate_limiter());

    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .route("/export", get(cart::export))
        .merge(mutations)
}

/// Create the studio routes router.
pub fn studio_routes() -> Router<AppState> {
    let mutations = Router::new()
        .route("/customizations", post(studio::create))
        .layer(cart_rate_limiter());

    Router::new()
        .route("/designs", get(studio::designs))
        .route("/options", get(studio::options))
        .route("/customizations/{id}", get(studio::show))
        .merge(mutations)
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::index))
        .route("/add", post(wishlist::add))
        .route("/remove", post(wishlist::remove))
        .route("/toggle", post(wishlist::toggle))
        .route("/move-to-cart", post(wishlist::move_to_cart))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::profile))
        .route("/profile", post(account::update_profile))
        .route("/password", post(account::change_password))
        .route(
            "/addresses",
            get(account::addresses).post(account::create_address),
        )
        .route("/addresses/{id}", post(account::update_address))
        .route("/addresses/{id}/delete", post(account::delete_address))
        .route("/addresses/{id}/default", post(account::set_default_address))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{number}", get(orders::show))
        .route("/{number}/cancel", post(orders::cancel))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/content/{key}", get(content::show))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/studio", studio_routes())
        .nest("/wishlist", wishlist_routes())
        .nest("/account", account_routes())
        .route(
            "/checkout",
            get(checkout::summary).post(checkout::place_order),
        )
        .nest("/orders", order_routes())
        .nest("/auth", auth_routes())
}

/// The storefront application with its middleware stack, minus Sentry.
///
/// Layers run outermost first: trace, request ID, security headers,
/// session, access control. Rate limits sit on their route groups.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.pool(), state.config());
    let access = state.access().clone();

    routes()
        .layer(from_fn_with_state(access, access_middleware))
        .layer(session_layer)
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

    use threadline_core::Role;
    use threadline_core::auth::{Claims, TokenKind};
    use threadline_core::UserId;

    use super::*;
    use crate::config::test_config;
    use crate::middleware::ACCESS_COOKIE;

    /// App over a pool that never connects; only routes that stay off the
    /// database can be exercised.
    fn test_app() -> (Router, AppState) {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/threadline_test")
            .unwrap();
        let state = AppState::new(test_config(), pool);
        (app(state.clone()), state)
    }

    fn access_cookie(state: &AppState) -> String {
        let claims = Claims::new(
            UserId::new(3),
            "grace@example.com",
            Role::Customer,
            TokenKind::Access,
            Utc::now(),
            chrono::Duration::minutes(15),
        );
        format!("{ACCESS_COOKIE}={}", state.codec().issue(&claims).unwrap())
    }

    fn peer(request: axum::http::request::Builder) -> axum::http::request::Builder {
        request.header("x-real-ip", "203.0.113.9")
    }

    #[tokio::test]
    async fn test_health() {
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
    async fn test_studio_options_are_public() {
        let (app, _) = test_app();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/studio/options")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_protected_page_redirects_guest_to_login() {
        let (app, _) = test_app();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/account/addresses?tab=2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/auth/login?redirect=%2Faccount%2Faddresses%3Ftab%3D2"
        );
    }

    #[tokio::test]
    async fn test_protected_action_rejects_guest_with_envelope() {
        let (app, _) = test_app();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/checkout")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"addressId":1}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Authentication required");
    }

    #[tokio::test]
    async fn test_signed_in_user_is_sent_home_from_login() {
        let (app, state) = test_app();
        let response = app
            .oneshot(
                peer(Request::builder().uri("/auth/login"))
                    .header(header::COOKIE, access_cookie(&state))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
    }

    #[tokio::test]
    async fn test_login_form_metadata_for_guest() {
        let (app, _) = test_app();
        let response = app
            .oneshot(
                peer(Request::builder().uri("/auth/login?redirect=//evil.example"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["redirect"], "/");
        assert_eq!(body["minPasswordLength"], 8);
    }

    #[tokio::test]
    async fn test_refresh_without_cookie_goes_to_login() {
        let (app, _) = test_app();
        let response = app
            .oneshot(
                peer(Request::builder().uri("/auth/refresh?redirect=/orders"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/auth/login?redirect=%2Forders"
        );
    }
}
