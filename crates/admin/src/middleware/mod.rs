//! HTTP middleware stack for the admin console.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction per route)
//! 2. `TraceLayer` (request span)
//! 3. Request ID
//! 4. Security headers
//! 5. Access control (admin token cookie, route classification)
//! 6. Rate limiting on `/auth` (governor)

pub mod access;
pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use access::{AccessControl, access_middleware, login_location};
pub use auth::{
    ACCESS_COOKIE, REFRESH_COOKIE, RequireAdmin, clear_session_cookies, set_access_cookie,
    set_session_cookies,
};
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
