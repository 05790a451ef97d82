//! Shipping addresses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use threadline_core::{AddressId, UserId};

/// A saved address.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub full_name: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub country: String,
    pub phone: Option<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

/// Address form submitted by the account area.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    pub full_name: String,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl AddressInput {
    /// Trim every field and drop blank optionals.
    ///
    /// # Errors
    ///
    /// Returns the name of the first required field that is blank.
    pub fn normalize(self) -> Result<Self, &'static str> {
        let required = |value: String, name: &'static str| {
            let trimmed = value.trim().to_owned();
            if trimmed.is_empty() {
                Err(name)
            } else {
                Ok(trimmed)
            }
        };
        let optional = |value: Option<String>| {
            value
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        Ok(Self {
            full_name: required(self.full_name, "fullName")?,
            line1: required(self.line1, "line1")?,
            line2: optional(self.line2),
            city: required(self.city, "city")?,
            region: required(self.region, "region")?,
            postal_code: required(self.postal_code, "postalCode")?,
            country: required(self.country, "country")?,
            phone: optional(self.phone),
        })
    }
}

/// Address copied onto an order at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressSnapshot {
    pub full_name: String,
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl From<&Address> for AddressSnapshot {
    fn from(address: &Address) -> Self {
        Self {
            full_name: address.full_name.clone(),
            line1: address.line1.clone(),
            line2: address.line2.clone(),
            city: address.city.clone(),
            region: address.region.clone(),
            postal_code: address.postal_code.clone(),
            country: address.country.clone(),
            phone: address.phone.clone(),
        }
    }
}
