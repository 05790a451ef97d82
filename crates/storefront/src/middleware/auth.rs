//! Token cookies and user extractors.
//!
//! The access middleware decodes the access-token cookie and stores a
//! [`CurrentUser`] in the request extensions; the extractors here read it
//! back out in handlers.

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use threadline_core::access::CurrentUser;

use crate::config::StorefrontConfig;
use crate::error::AppError;
use crate::services::auth::SessionTokens;

/// Cookie holding the short-lived access token.
pub const ACCESS_COOKIE: &str = "tl_access";

/// Cookie holding the long-lived refresh token.
pub const REFRESH_COOKIE: &str = "tl_refresh";

/// Extractor that requires a signed-in user.
///
/// Protected paths are already guarded by the access middleware; this
/// rejects with 401 if a handler outside them asks for a user anyway.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireUser(user): RequireUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireUser(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_owned()))
    }
}

/// Extractor that optionally gets the signed-in user.
pub struct OptionalUser(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<CurrentUser>().cloned()))
    }
}

/// Add both token cookies.
#[must_use]
pub fn set_session_cookies(
    jar: CookieJar,
    tokens: &SessionTokens,
    config: &StorefrontConfig,
) -> CookieJar {
    let refresh = token_cookie(
        REFRESH_COOKIE,
        tokens.refresh.clone(),
        time::Duration::days(config.auth.refresh_ttl_days),
        config.secure_cookies(),
    );
    set_access_cookie(jar, &tokens.access, config).add(refresh)
}

/// Add (or replace) the access-token cookie.
#[must_use]
pub fn set_access_cookie(jar: CookieJar, token: &str, config: &StorefrontConfig) -> CookieJar {
    jar.add(token_cookie(
        ACCESS_COOKIE,
        token.to_owned(),
        time::Duration::minutes(config.auth.access_ttl_minutes),
        config.secure_cookies(),
    ))
}

/// Remove both token cookies.
#[must_use]
pub fn clear_session_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(ACCESS_COOKIE).path("/"))
        .remove(Cookie::build(REFRESH_COOKIE).path("/"))
}

fn token_cookie(
    name: &'static str,
    value: String,
    max_age: time::Duration,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(max_age)
        .build()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::test_config;

    fn config(base_url: &str) -> StorefrontConfig {
        StorefrontConfig {
            base_url: base_url.to_owned(),
            ..test_config()
        }
    }

    fn tokens() -> SessionTokens {
        SessionTokens {
            access: "a.b.c".to_owned(),
            refresh: "d.e.f".to_owned(),
        }
    }

    #[test]
    fn test_session_cookie_attributes() {
        let jar = set_session_cookies(CookieJar::new(), &tokens(), &config("https://shop.test"));

        let access = jar.get(ACCESS_COOKIE).unwrap();
        assert_eq!(access.value(), "a.b.c");
        assert_eq!(access.http_only(), Some(true));
        assert_eq!(access.same_site(), Some(SameSite::Lax));
        assert_eq!(access.secure(), Some(true));
        assert_eq!(access.path(), Some("/"));
        assert_eq!(access.max_age(), Some(time::Duration::minutes(15)));

        let refresh = jar.get(REFRESH_COOKIE).unwrap();
        assert_eq!(refresh.max_age(), Some(time::Duration::days(30)));
    }

    #[test]
    fn test_plain_http_cookies_are_not_secure() {
        let jar = set_session_cookies(CookieJar::new(), &tokens(), &config("http://localhost:3000"));
        assert_eq!(jar.get(ACCESS_COOKIE).unwrap().secure(), Some(false));
    }

    #[test]
    fn test_clear_session_cookies() {
        let jar = set_session_cookies(CookieJar::new(), &tokens(), &config("http://localhost:3000"));
        let jar = clear_session_cookies(jar);
        assert!(jar.get(ACCESS_COOKIE).is_none());
        assert!(jar.get(REFRESH_COOKIE).is_none());
    }
}
