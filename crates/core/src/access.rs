//! Static route classification and access decisions.
//!
//! A [`RoutePolicy`] sorts request paths into [`RouteClass`]es from three
//! prefix lists. [`RoutePolicy::decide`] combines the class with the state
//! of the caller's access token into an [`AccessDecision`]. The HTTP layer
//! turns decisions into redirects or JSON failures.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auth::{Claims, TokenCodec, TokenError, TokenKind};
use crate::types::{Role, UserId};

/// How a path is guarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteClass {
    Public,
    /// Any signed-in user.
    Protected,
    /// Signed-in admins only.
    Admin,
    /// Only for visitors who are not signed in (login, register).
    GuestOnly,
}

/// The caller's access token, as read from the cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenState {
    Missing,
    /// Malformed, bad signature, wrong kind or unknown role.
    Invalid,
    /// Signed correctly but past `exp`.
    Expired,
    Valid(Claims),
}

impl TokenState {
    /// Classify an optional access-token cookie value.
    #[must_use]
    pub fn from_cookie(codec: &TokenCodec, token: Option<&str>, now: DateTime<Utc>) -> Self {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return Self::Missing;
        };

        match codec.verify(token, TokenKind::Access, now) {
            Ok(claims) => Self::Valid(claims),
            Err(TokenError::Expired) => Self::Expired,
            Err(_) => Self::Invalid,
        }
    }

    /// The signed-in user, when the token is valid.
    #[must_use]
    pub fn current_user(&self) -> Option<CurrentUser> {
        match self {
            Self::Valid(claims) => Some(CurrentUser::from(claims)),
            Self::Missing | Self::Invalid | Self::Expired => None,
        }
    }
}

/// The authenticated caller, placed in request extensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: String,
    pub role: Role,
}

impl CurrentUser {
    /// Whether the caller may use the admin console.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<&Claims> for CurrentUser {
    fn from(claims: &Claims) -> Self {
        Self {
            id: claims.user_id,
            email: claims.email.clone(),
            role: claims.role,
        }
    }
}

/// Outcome of an access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    /// Not signed in: send to `/auth/login?redirect=...`.
    RedirectToLogin,
    /// Access token expired: send to `/auth/refresh?redirect=...`.
    RedirectToRefresh,
    /// Signed in but not allowed here: send to `/`.
    RedirectHome,
}

/// Three prefix lists describing which paths need what.
///
/// An entry matches the exact path or any sub-path, so `/account` covers
/// `/account/orders` but not `/accounts`.
#[derive(Debug, Clone, Default)]
pub struct RoutePolicy {
    protected: Vec<String>,
    guest_only: Vec<String>,
    admin: Vec<String>,
}

impl RoutePolicy {
    /// Build a policy from the three lists.
    #[must_use]
    pub fn new(protected: &[&str], guest_only: &[&str], admin: &[&str]) -> Self {
        let owned =
            |list: &[&str]| -> Vec<String> { list.iter().copied().map(normalize_prefix).collect() };
        Self {
            protected: owned(protected),
            guest_only: owned(guest_only),
            admin: owned(admin),
        }
    }

    /// The storefront's policy.
    #[must_use]
    pub fn storefront() -> Self {
        Self::new(
            &[
                "/account",
                "/checkout",
                "/orders",
                "/wishlist",
                "/studio/customizations",
            ],
            &["/auth/login", "/auth/register"],
            &[],
        )
    }

    /// The admin console's policy.
    #[must_use]
    pub fn admin_console() -> Self {
        Self::new(&[], &["/auth/login"], &["/admin"])
    }

    /// Classify a request path. Admin beats protected beats guest-only.
    #[must_use]
    pub fn classify(&self, path: &str) -> RouteClass {
        let hit = |list: &[String]| list.iter().any(|prefix| path_has_prefix(path, prefix));

        if hit(&self.admin) {
            RouteClass::Admin
        } else if hit(&self.protected) {
            RouteClass::Protected
        } else if hit(&self.guest_only) {
            RouteClass::GuestOnly
        } else {
            RouteClass::Public
        }
    }

    /// Decide what to do with a request to `path` carrying `token`.
    #[must_use]
    pub fn decide(&self, path: &str, token: &TokenState) -> AccessDecision {
        decide(self.classify(path), token)
    }
}

/// The decision table.
#[must_use]
pub fn decide(class: RouteClass, token: &TokenState) -> AccessDecision {
    use AccessDecision::{Allow, RedirectHome, RedirectToLogin, RedirectToRefresh};

    match (class, token) {
        (RouteClass::Public, _) => Allow,

        (RouteClass::Protected | RouteClass::Admin, TokenState::Missing | TokenState::Invalid) => {
            RedirectToLogin
        }
        (RouteClass::Protected | RouteClass::Admin, TokenState::Expired) => RedirectToRefresh,
        (RouteClass::Protected, TokenState::Valid(_)) => Allow,
        (RouteClass::Admin, TokenState::Valid(claims)) => match claims.role {
            Role::Admin => Allow,
            Role::Customer => RedirectHome,
        },

        (RouteClass::GuestOnly, TokenState::Valid(_)) => RedirectHome,
        (RouteClass::GuestOnly, TokenState::Missing | TokenState::Invalid | TokenState::Expired) => {
            Allow
        }
    }
}

/// Reduce a user-supplied redirect target to a same-site path.
///
/// Anything that does not start with a single `/` (absolute URLs,
/// protocol-relative `//host`, backslash tricks) becomes `/`.
#[must_use]
pub fn sanitize_redirect(target: Option<&str>) -> String {
    match target {
        Some(t)
            if t.starts_with('/')
                && !t.starts_with("//")
                && !t.starts_with("/\\")
                && !t.chars().any(char::is_control) =>
        {
            t.to_owned()
        }
        _ => "/".to_owned(),
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_owned()
    } else {
        trimmed.to_owned()
    }
}

fn path_has_prefix(path: &str, prefix: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    const SECRET: &[u8] = b"kP9$wq2!Lz7@Rm4#Xt8&Bv1*Nc6^Hs3%";

    fn valid(role: Role) -> TokenState {
        TokenState::Valid(Claims::new(
            UserId::new(7),
            "grace@example.com",
            role,
            TokenKind::Access,
            Utc::now(),
            Duration::minutes(15),
        ))
    }

    #[test]
    fn test_prefix_boundaries() {
        let policy = RoutePolicy::storefront();
        assert_eq!(policy.classify("/account"), RouteClass::Protected);
        assert_eq!(policy.classify("/account/orders"), RouteClass::Protected);
        assert_eq!(policy.classify("/accounts"), RouteClass::Public);
        assert_eq!(policy.classify("/studio/designs"), RouteClass::Public);
        assert_eq!(
            policy.classify("/studio/customizations/3"),
            RouteClass::Protected
        );
        assert_eq!(policy.classify("/auth/login"), RouteClass::GuestOnly);
        assert_eq!(policy.classify("/auth/logout"), RouteClass::Public);
        assert_eq!(policy.classify("/"), RouteClass::Public);
    }

    #[test]
    fn test_precedence_admin_over_protected_over_guest_only() {
        let policy = RoutePolicy::new(&["/x"], &["/x", "/y"], &["/x/admin", "/y"]);
        assert_eq!(policy.classify("/x/admin/users"), RouteClass::Admin);
        assert_eq!(policy.classify("/x/other"), RouteClass::Protected);
        assert_eq!(policy.classify("/y"), RouteClass::Admin);
    }

    #[test]
    fn test_trailing_slash_in_list_entry() {
        let policy = RoutePolicy::new(&["/account/"], &[], &[]);
        assert_eq!(policy.classify("/account"), RouteClass::Protected);
    }

    #[test]
    fn test_admin_console_policy() {
        let policy = RoutePolicy::admin_console();
        assert_eq!(policy.classify("/admin"), RouteClass::Admin);
        assert_eq!(policy.classify("/admin/orders/TL-1"), RouteClass::Admin);
        assert_eq!(policy.classify("/auth/login"), RouteClass::GuestOnly);
        assert_eq!(policy.classify("/health"), RouteClass::Public);
    }

    #[test]
    fn test_decision_table() {
        use AccessDecision::{Allow, RedirectHome, RedirectToLogin, RedirectToRefresh};

        let customer = valid(Role::Customer);
        let admin = valid(Role::Admin);
        let states = [
            TokenState::Missing,
            TokenState::Invalid,
            TokenState::Expired,
            customer,
            admin,
        ];
        let expected = [
            (RouteClass::Public, [Allow, Allow, Allow, Allow, Allow]),
            (
                RouteClass::Protected,
                [RedirectToLogin, RedirectToLogin, RedirectToRefresh, Allow, Allow],
            ),
            (
                RouteClass::Admin,
                [RedirectToLogin, RedirectToLogin, RedirectToRefresh, RedirectHome, Allow],
            ),
            (
                RouteClass::GuestOnly,
                [Allow, Allow, Allow, RedirectHome, RedirectHome],
            ),
        ];

        for (class, row) in expected {
            for (state, want) in states.iter().zip(row) {
                assert_eq!(decide(class, state), want, "{class:?} / {state:?}");
            }
        }
    }

    #[test]
    fn test_token_state_from_cookie() {
        let codec = TokenCodec::new(SECRET);
        let now = Utc::now();
        let claims = Claims::new(
            UserId::new(1),
            "a@b.co",
            Role::Customer,
            TokenKind::Access,
            now,
            Duration::minutes(15),
        );
        let token = codec.issue(&claims).unwrap();

        assert_eq!(TokenState::from_cookie(&codec, None, now), TokenState::Missing);
        assert_eq!(TokenState::from_cookie(&codec, Some(""), now), TokenState::Missing);
        assert_eq!(
            TokenState::from_cookie(&codec, Some("garbage"), now),
            TokenState::Invalid
        );
        assert_eq!(
            TokenState::from_cookie(&codec, Some(&token), now + Duration::hours(1)),
            TokenState::Expired
        );

        let state = TokenState::from_cookie(&codec, Some(&token), now);
        let user = state.current_user().unwrap();
        assert_eq!(user.id, UserId::new(1));
        assert!(!user.is_admin());
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let codec = TokenCodec::new(SECRET);
        let now = Utc::now();
        let refresh = Claims::new(
            UserId::new(1),
            "a@b.co",
            Role::Customer,
            TokenKind::Refresh,
            now,
            Duration::days(30),
        );
        let token = codec.issue(&refresh).unwrap();
        assert_eq!(
            TokenState::from_cookie(&codec, Some(&token), now),
            TokenState::Invalid
        );
    }

    #[test]
    fn test_sanitize_redirect() {
        assert_eq!(sanitize_redirect(Some("/account?tab=1")), "/account?tab=1");
        assert_eq!(sanitize_redirect(Some("//evil.example")), "/");
        assert_eq!(sanitize_redirect(Some("/\\evil.example")), "/");
        assert_eq!(sanitize_redirect(Some("https://evil.example")), "/");
        assert_eq!(sanitize_redirect(Some("account")), "/");
        assert_eq!(sanitize_redirect(None), "/");
    }
}
