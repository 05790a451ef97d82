//! Admin account commands.
//!
//! # Usage
//!
//! ```bash
//! # Create an admin account directly
//! tl-cli admin create -e ops@example.com -n "Ops" -p 'long passphrase'
//!
//! # Promote an existing account
//! tl-cli admin promote -e grace@example.com
//! ```

use sqlx::PgPool;
use thiserror::Error;

use threadline_core::auth::{PasswordError, hash_password, validate_password};
use threadline_core::{Email, Role, UserId};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Missing environment variable: STOREFRONT_DATABASE_URL (or DATABASE_URL)")]
    MissingDatabaseUrl,

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(#[from] PasswordError),

    #[error("An account already exists with email: {0}")]
    UserExists(String),

    #[error("No account with email: {0}")]
    UserNotFound(String),
}

/// Create a new admin account with a password.
///
/// # Errors
///
/// Returns `AdminError` for an invalid email or password, an existing
/// account, or a database failure.
pub async fn create_user(email: &str, name: &str, password: &str) -> Result<UserId, AdminError> {
    let email = Email::parse(email).map_err(|e| AdminError::InvalidEmail(e.to_string()))?;
    validate_password(password)?;
    let password_hash = hash_password(password)?;

    let pool = pool().await?;
    tracing::info!("Creating admin account: {}", email);

    let user_id = insert_admin(&pool, &email, name, &password_hash).await?;

    tracing::info!(
        "Admin account created successfully! ID: {}, Email: {}",
        user_id,
        email
    );
    Ok(user_id)
}

/// Give an existing account the admin role.
///
/// # Errors
///
/// Returns `AdminError::UserNotFound` if no account has that email.
pub async fn promote_user(email: &str) -> Result<(), AdminError> {
    let email = Email::parse(email).map_err(|e| AdminError::InvalidEmail(e.to_string()))?;

    let pool = pool().await?;
    let updated = sqlx::query("UPDATE store.user SET role = $2, updated_at = now() WHERE email = $1")
        .bind(email.as_str())
        .bind(Role::Admin)
        .execute(&pool)
        .await?
        .rows_affected();

    if updated == 0 {
        return Err(AdminError::UserNotFound(email.to_string()));
    }

    tracing::info!("{} is now an admin", email);
    Ok(())
}

async fn pool() -> Result<PgPool, AdminError> {
    let database_url = super::database_url().ok_or(AdminError::MissingDatabaseUrl)?;
    Ok(super::connect(&database_url).await?)
}

async fn insert_admin(
    pool: &PgPool,
    email: &Email,
    name: &str,
    password_hash: &str,
) -> Result<UserId, AdminError> {
    let mut tx = pool.begin().await?;

    let user_id = sqlx::query_scalar::<_, UserId>(
        r"
        INSERT INTO store.user (email, name, role)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO NOTHING
        RETURNING id
        ",
    )
    .bind(email.as_str())
    .bind(name)
    .bind(Role::Admin)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AdminError::UserExists(email.to_string()))?;

    sqlx::query("INSERT INTO store.user_password (user_id, password_hash) VALUES ($1, $2)")
        .bind(user_id)
        .bind(password_hash)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(user_id)
}
