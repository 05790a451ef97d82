//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use threadline_core::{Email, Role, UserId};

/// A storefront account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Display name, if the user set one.
    pub name: Option<String>,
    /// Account role.
    pub role: Role,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}
