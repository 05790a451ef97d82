//! Account types for the console.

use chrono::{DateTime, Utc};
use serde::Serialize;

use threadline_core::{Role, UserId};

/// A signed-in administrator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub id: UserId,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
}

/// A row of the user list.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    pub order_count: i64,
    pub created_at: DateTime<Utc>,
}
