//! Saved shipping addresses.
//!
//! At most one address per user is the default (partial unique index
//! `address_one_default_idx`). Changing the default happens in a
//! transaction so the index is never violated mid-way.

use sqlx::{PgConnection, PgPool};

use threadline_core::{AddressId, UserId};

use super::RepositoryError;
use crate::models::{Address, AddressInput};

const ADDRESS_COLUMNS: &str = "id, user_id, full_name, line1, line2, city, region, postal_code, \
                               country, phone, is_default, created_at";

/// Repository for addresses.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A user's addresses, default first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let addresses = sqlx::query_as::<_, Address>(&format!(
            r"
            SELECT {ADDRESS_COLUMNS}
            FROM store.address
            WHERE user_id = $1
            ORDER BY is_default DESC, created_at DESC, id DESC
            "
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(addresses)
    }

    /// Get one of the user's addresses.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        get_for_user(&mut conn, user_id, id).await
    }

    /// Create an address. The user's first address becomes the default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn create(
        &self,
        user_id: UserId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let has_default = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM store.address WHERE user_id = $1 AND is_default)",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let address = sqlx::query_as::<_, Address>(&format!(
            r"
            INSERT INTO store.address
                (user_id, full_name, line1, line2, city, region, postal_code, country, phone, is_default)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {ADDRESS_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(&input.full_name)
        .bind(&input.line1)
        .bind(input.line2.as_deref())
        .bind(&input.city)
        .bind(&input.region)
        .bind(&input.postal_code)
        .bind(&input.country)
        .bind(input.phone.as_deref())
        .bind(!has_default)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(address)
    }

    /// Replace the fields of an address. The default flag is untouched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no such address.
    pub async fn update(
        &self,
        user_id: UserId,
        id: AddressId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        sqlx::query_as::<_, Address>(&format!(
            r"
            UPDATE store.address
            SET full_name = $3, line1 = $4, line2 = $5, city = $6, region = $7,
                postal_code = $8, country = $9, phone = $10
            WHERE id = $1 AND user_id = $2
            RETURNING {ADDRESS_COLUMNS}
            "
        ))
        .bind(id)
        .bind(user_id)
        .bind(&input.full_name)
        .bind(&input.line1)
        .bind(input.line2.as_deref())
        .bind(&input.city)
        .bind(&input.region)
        .bind(&input.postal_code)
        .bind(&input.country)
        .bind(input.phone.as_deref())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete an address. Deleting the default promotes the most recently
    /// created remaining address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no such address.
    pub async fn delete(&self, user_id: UserId, id: AddressId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let was_default = sqlx::query_scalar::<_, bool>(
            "DELETE FROM store.address WHERE id = $1 AND user_id = $2 RETURNING is_default",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        if was_default {
            sqlx::query(
                r"
                UPDATE store.address
                SET is_default = TRUE
                WHERE id = (
                    SELECT id FROM store.address
                    WHERE user_id = $1
                    ORDER BY created_at DESC, id DESC
                    LIMIT 1
                )
                ",
            )
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Make an address the user's default, unsetting the previous one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no such address.
    pub async fn set_default(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if get_for_user(&mut tx, user_id, id).await?.is_none() {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query(
            "UPDATE store.address SET is_default = FALSE WHERE user_id = $1 AND is_default AND id <> $2",
        )
        .bind(user_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let address = sqlx::query_as::<_, Address>(&format!(
            "UPDATE store.address SET is_default = TRUE WHERE id = $1 RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(address)
    }
}

/// Fetch an address only if it belongs to `user_id`.
pub(crate) async fn get_for_user(
    conn: &mut PgConnection,
    user_id: UserId,
    id: AddressId,
) -> Result<Option<Address>, RepositoryError> {
    let address = sqlx::query_as::<_, Address>(&format!(
        "SELECT {ADDRESS_COLUMNS} FROM store.address WHERE id = $1 AND user_id = $2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(conn)
    .await?;

    Ok(address)
}
