//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction per route)
//! 2. `TraceLayer` (request span)
//! 3. Request ID
//! 4. Security headers
//! 5. Session layer (tower-sessions with `PostgreSQL` store)
//! 6. Access control (token cookie, route classification)
//! 7. Rate limiting, per route group (governor)

pub mod access;
pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use access::{AccessControl, access_middleware, login_location};
pub use auth::{
    ACCESS_COOKIE, OptionalUser, REFRESH_COOKIE, RequireUser, clear_session_cookies,
    set_access_cookie, set_session_cookies,
};
pub use rate_limit::{auth_rate_limiter, cart_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{
    create_session_layer, discard_guest_cart, load_guest_cart, store_guest_cart,
};
