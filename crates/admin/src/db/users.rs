//! Account administration and admin sign-in lookups.

use sqlx::PgPool;

use threadline_core::{Role, UserId};

use super::RepositoryError;
use crate::models::{AdminUser, UserSummary};

#[derive(sqlx::FromRow)]
struct CredentialRow {
    id: UserId,
    email: String,
    name: Option<String>,
    role: Role,
    password_hash: Option<String>,
}

/// Repository for users.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All accounts with their order counts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<UserSummary>, RepositoryError> {
        let users = sqlx::query_as::<_, UserSummary>(
            r"
            SELECT u.id, u.email, u.name, u.role, u.created_at,
                   (SELECT COUNT(*) FROM store.customer_order o WHERE o.user_id = u.id) AS order_count
            FROM store.user u
            ORDER BY u.created_at DESC, u.id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(users)
    }

    /// Get an account by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: UserId) -> Result<Option<AdminUser>, RepositoryError> {
        let user = sqlx::query_as::<_, (UserId, String, Option<String>, Role)>(
            "SELECT id, email, name, role FROM store.user WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .map(|(id, email, name, role)| AdminUser {
            id,
            email,
            name,
            role,
        });

        Ok(user)
    }

    /// Account and password hash by (already normalized) email.
    ///
    /// Returns `None` if the account doesn't exist or has no password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_password_hash(
        &self,
        email: &str,
    ) -> Result<Option<(AdminUser, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r"
            SELECT u.id, u.email, u.name, u.role, p.password_hash
            FROM store.user u
            LEFT JOIN store.user_password p ON p.user_id = u.id
            WHERE u.email = $1
            ",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.and_then(|row| {
            let hash = row.password_hash?;
            let user = AdminUser {
                id: row.id,
                email: row.email,
                name: row.name,
                role: row.role,
            };
            Some((user, hash))
        }))
    }

    /// Change an account's role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account does not exist.
    pub async fn set_role(&self, id: UserId, role: Role) -> Result<(), RepositoryError> {
        let updated =
            sqlx::query("UPDATE store.user SET role = $2, updated_at = now() WHERE id = $1")
                .bind(id)
                .bind(role)
                .execute(self.pool)
                .await?
                .rows_affected();

        if updated == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
