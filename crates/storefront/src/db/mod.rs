//! Database operations for the storefront.
//!
//! # Schema: `store`
//!
//! ## Tables
//!
//! - `user`, `user_password` - Accounts and Argon2 password hashes
//! - `address` - Saved shipping addresses
//! - `product`, `product_variant` - Catalog
//! - `design`, `customization` - Embroidery designs and saved customizations
//! - `cart`, `cart_item` - Server-side carts (derived `subtotal`/`item_count`)
//! - `wishlist_item`
//! - `customer_order`, `customer_order_item` - Orders with snapshotted lines
//! - `setting` - Content blocks managed by the admin console
//!
//! Sessions live in the `tower_sessions` schema owned by `tower-sessions-sqlx-store`.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p threadline-cli -- migrate
//! ```

pub mod addresses;
pub mod carts;
pub mod customizations;
pub mod designs;
pub mod orders;
pub mod products;
pub mod settings;
pub mod users;
pub mod wishlist;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use addresses::AddressRepository;
pub use carts::CartRepository;
pub use customizations::CustomizationRepository;
pub use designs::DesignRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use settings::SettingsRepository;
pub use users::UserRepository;
pub use wishlist::WishlistRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map unique violations to `Conflict`, everything else to `Database`.
    pub(crate) fn from_unique(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(err)
    }

    /// Whether a value overflowed its column (`numeric_value_out_of_range`).
    pub(crate) fn is_out_of_range(&self) -> bool {
        matches!(
            self,
            Self::Database(sqlx::Error::Database(db_err))
                if db_err.code().as_deref() == Some("22003")
        )
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
