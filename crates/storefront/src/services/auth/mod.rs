//! Authentication service.
//!
//! Password accounts plus the access/refresh token pair that both binaries
//! read from cookies.

mod error;

pub use error::AuthError;

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use threadline_core::auth::{
    Claims, TokenCodec, TokenKind, hash_password, validate_password, verify_password,
};
use threadline_core::{Email, UserId};

use crate::config::AuthConfig;
use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::User;

/// Signed tokens for a signed-in user.
#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub access: String,
    pub refresh: String,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a customer with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;
        let name = name.map(str::trim).filter(|n| !n.is_empty());

        self.users
            .create_with_password(&email, name, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_with_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Change a password after checking the current one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if `current` is wrong.
    /// Returns `AuthError::WeakPassword` if `new` is too short.
    pub async fn change_password(
        &self,
        user_id: UserId,
        current: &str,
        new: &str,
    ) -> Result<(), AuthError> {
        let password_hash = self
            .users
            .get_password_hash(user_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(current, &password_hash)?;
        validate_password(new)?;

        let new_hash = hash_password(new)?;
        self.users.set_password_hash(user_id, &new_hash).await?;

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    /// Exchange a refresh token for the current state of its user.
    ///
    /// The user is re-read so role changes take effect on refresh.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` if the token is not a valid refresh token.
    /// Returns `AuthError::UserNotFound` if the account no longer exists.
    pub async fn refresh(
        &self,
        codec: &TokenCodec,
        refresh_token: &str,
        now: DateTime<Utc>,
    ) -> Result<User, AuthError> {
        let claims = codec.verify(refresh_token, TokenKind::Refresh, now)?;

        self.users
            .get_by_id(claims.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
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
    user: &User,
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
    user: &User,
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
    use secrecy::SecretString;
    use threadline_core::Role;

    use super::*;

    fn config() -> AuthConfig {
        AuthConfig {
            token_secret: SecretString::from("kP9$wq2!Lz7@Rm4#Xt8&Bv1*Nc6^Hs3%"),
            access_ttl_minutes: 15,
            refresh_ttl_days: 30,
        }
    }

    fn user() -> User {
        User {
            id: UserId::new(9),
            email: Email::parse("grace@example.com").unwrap(),
            name: None,
            role: Role::Admin,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_issue_tokens_have_distinct_kinds() {
        let config = config();
        let codec = TokenCodec::new(config.key());
        let now = Utc::now();
        let tokens = issue_tokens(&codec, &config, &user(), now).unwrap();

        let access = codec.verify(&tokens.access, TokenKind::Access, now).unwrap();
        assert_eq!(access.role, Role::Admin);
        assert_eq!(access.expires_at - access.issued_at, 15 * 60);

        let refresh = codec.verify(&tokens.refresh, TokenKind::Refresh, now).unwrap();
        assert_eq!(refresh.expires_at - refresh.issued_at, 30 * 24 * 60 * 60);
        assert!(codec.verify(&tokens.refresh, TokenKind::Access, now).is_err());
    }

    #[test]
    fn test_password_errors_map_to_auth_errors() {
        assert!(matches!(
            AuthError::from(threadline_core::auth::PasswordError::Mismatch),
            AuthError::InvalidCredentials
        ));
        assert!(matches!(
            AuthError::from(threadline_core::auth::PasswordError::TooShort),
            AuthError::WeakPassword(_)
        ));
    }
}
