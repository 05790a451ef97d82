//! Admin token cookies and the admin extractor.
//!
//! The console uses its own cookie names so a storefront session in the
//! same browser never signs anyone into the console.

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use threadline_core::access::CurrentUser;

use crate::config::AdminConfig;
use crate::error::AppError;
use crate::services::auth::SessionTokens;

/// Cookie holding the short-lived access token.
pub const ACCESS_COOKIE: &str = "tl_admin_access";

/// Cookie holding the long-lived refresh token.
pub const REFRESH_COOKIE: &str = "tl_admin_refresh";

/// Extractor that requires a signed-in admin.
///
/// `/admin` is already guarded by the access middleware; this is the
/// handler-level check.
pub struct RequireAdmin(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_owned()))?;

        if !user.is_admin() {
            return Err(AppError::Forbidden("Admin access required".to_owned()));
        }
        Ok(Self(user))
    }
}

/// Add both token cookies.
#[must_use]
pub fn set_session_cookies(jar: CookieJar, tokens: &SessionTokens, config: &AdminConfig) -> CookieJar {
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
pub fn set_access_cookie(jar: CookieJar, token: &str, config: &AdminConfig) -> CookieJar {
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

    #[test]
    fn test_cookies_use_admin_names() {
        let tokens = SessionTokens {
            access: "a.b.c".to_owned(),
            refresh: "d.e.f".to_owned(),
        };
        let jar = set_session_cookies(CookieJar::new(), &tokens, &test_config());

        let access = jar.get(ACCESS_COOKIE).unwrap();
        assert_eq!(access.value(), "a.b.c");
        assert_eq!(access.http_only(), Some(true));
        assert_eq!(access.same_site(), Some(SameSite::Lax));
        assert_eq!(jar.get(REFRESH_COOKIE).unwrap().value(), "d.e.f");
        assert!(jar.get("tl_access").is_none());
    }

    #[test]
    fn test_clear_removes_both() {
        let jar = CookieJar::new()
            .add(Cookie::new(ACCESS_COOKIE, "x"))
            .add(Cookie::new(REFRESH_COOKIE, "y"));
        let jar = clear_session_cookies(jar);
        assert!(jar.get(ACCESS_COOKIE).is_none_or(|c| c.value().is_empty()));
        assert!(jar.get(REFRESH_COOKIE).is_none_or(|c| c.value().is_empty()));
    }
}
