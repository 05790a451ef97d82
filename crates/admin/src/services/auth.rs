//! Admin sign-in.
//!
//! Admins are ordinary accounts with role `admin`. They sign in with the
//! same password hash and receive the same token pair as on the
//! storefront, under the console's own cookie names.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use thiserror::Error;

use threadline_core::Email;
use threadline_core::auth::{Claims, PasswordError, TokenCodec, TokenError, TokenKind, verify_password};

use crate::config::AuthConfig;
use crate::db::{RepositoryError, UserRepository};
use crate::models::AdminUser;

/// Errors from admin authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong email or password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Valid credentials for an account that is not an admin.
    #[error("account is not an admin")]
    NotAdmin,

    /// The account vanished after the token was issued.
    #[error("user not found")]
    UserNotFound,

    /// Token could not be issued or read.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::Hash => Self::PasswordHash,
            PasswordError::TooShort | PasswordError::Mismatch => Self::InvalidCredentials,
        }
    }
}

/// Signed tokens for a signed-in admin.
#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub access: String,
    pub refresh: String,
}

/// Admin authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Verify credentials and require the admin role.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    /// Returns `AuthError::NotAdmin` if the password is right but the role is not.
    pub async fn login(&self, email: &str, password: &str) -> Result<AdminUser, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_with_password_hash(email.as_str())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;
        require_admin(user)
    }

    /// Exchange a refresh token for the current state of its admin.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` if the token is not a valid refresh token.
    /// Returns `AuthError::NotAdmin` if the account was demoted since.
    pub async fn refresh(
        &self,
        codec: &TokenCodec,
        refresh_token: &str,
        now: DateTime<Utc>,
    ) -> Result<AdminUser, AuthError> {
        let claims = codec.verify(refresh_token, TokenKind::Refresh, now)?;

        let user = self
            .users
            .get(claims.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        require_admin(user)
    }
}

fn require_admin(user: AdminUser) -> Result<AdminUser, AuthError> {
    if user.role.is_admin() {
        Ok(user)
    } else {
        tracing::warn!(user_id = %user.id, "Non-admin attempted console sign-in");
        Err(AuthError::NotAdmin)
    }
}

/// Issue an access token for `user`.
///
/// # Errors
///
/// Returns `AuthError::Token` if signing fails.
pub fn issue_access_token(
    codec: &TokenCodec,
    config: &AuthConfig,
    user: &AdminUser,
    now: DateTime<Utc>,
) -> Result<String, AuthError> {
    let claims = Claims::new(
        user.id,
        user.email.as_str(),
        user.role,
        TokenKind::Access,
        now,
        Duration::minutes(config.access_ttl_minutes),
    );
    Ok(codec.issue(&claims)?)
}

/// Issue an access and refresh token pair for `user`.
///
/// # Errors
///
/// Returns `AuthError::Token` if signing fails.
pub fn issue_tokens(
    codec: &TokenCodec,
    config: &AuthConfig,
    user: &AdminUser,
    now: DateTime<Utc>,
) -> Result<SessionTokens, AuthError> {
    let refresh = Claims::new(
        user.id,
        user.email.as_str(),
        user.role,
        TokenKind::Refresh,
        now,
        Duration::days(config.refresh_ttl_days),
    );

    Ok(SessionTokens {
        access: issue_access_token(codec, config, user, now)?,
        refresh: codec.issue(&refresh)?,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use threadline_core::{Role, UserId};

    use super::*;
    use crate::config::test_config;

    fn user(role: Role) -> AdminUser {
        AdminUser {
            id: UserId::new(1),
            email: "ops@threadline.test".to_owned(),
            name: None,
            role,
        }
    }

    #[test]
    fn test_require_admin() {
        assert!(require_admin(user(Role::Admin)).is_ok());
        assert!(matches!(
            require_admin(user(Role::Customer)),
            Err(AuthError::NotAdmin)
        ));
    }

    #[test]
    fn test_issued_tokens_verify_with_their_kind() {
        let config = test_config();
        let codec = TokenCodec::new(config.auth.key());
        let now = Utc::now();
        let tokens = issue_tokens(&codec, &config.auth, &user(Role::Admin), now).unwrap();

        let access = codec.verify(&tokens.access, TokenKind::Access, now).unwrap();
        assert_eq!(access.role, Role::Admin);
        assert!(codec.verify(&tokens.access, TokenKind::Refresh, now).is_err());
        assert!(codec.verify(&tokens.refresh, TokenKind::Refresh, now).is_ok());
    }

    #[test]
    fn test_password_mismatch_is_invalid_credentials() {
        assert!(matches!(
            AuthError::from(PasswordError::Mismatch),
            AuthError::InvalidCredentials
        ));
    }
}
