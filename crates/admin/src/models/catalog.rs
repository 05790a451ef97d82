//! Catalog rows and the inputs that edit them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use threadline_core::{DesignId, Price, ProductId, ProductStatus, VariantId};

/// A product row, any status.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub base_price: Price,
    pub status: ProductStatus,
    pub image_url: Option<String>,
    pub customizable: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A variant row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: VariantId,
    pub product_id: ProductId,
    pub sku: String,
    pub size: String,
    pub color: String,
    pub price_override: Option<Price>,
    pub stock: i32,
}

/// An embroidery design row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Design {
    pub id: DesignId,
    pub name: String,
    pub image_url: String,
    pub price: Price,
    pub active: bool,
}

/// Create/update body for a product. New products start as drafts.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub base_price: Price,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub customizable: bool,
}

impl ProductInput {
    /// Check the fields the database cannot.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first bad field.
    pub fn validate(&self) -> Result<(), String> {
        if !is_slug(&self.slug) {
            return Err("Slug must be lowercase letters, digits and dashes".to_owned());
        }
        if self.title.trim().is_empty() {
            return Err("Title is required".to_owned());
        }
        if self.base_price.is_negative() {
            return Err("Price must not be negative".to_owned());
        }
        Ok(())
    }
}

/// New variant body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantInput {
    pub sku: String,
    pub size: String,
    pub color: String,
    #[serde(default)]
    pub price_override: Option<Price>,
    #[serde(default)]
    pub stock: i32,
}

impl VariantInput {
    /// # Errors
    ///
    /// Returns a message naming the first bad field.
    pub fn validate(&self) -> Result<(), String> {
        if self.sku.trim().is_empty() || self.size.trim().is_empty() || self.color.trim().is_empty()
        {
            return Err("SKU, size and color are required".to_owned());
        }
        validate_stock_and_price(Some(self.stock), self.price_override)
    }
}

/// Variant price/stock change. Absent fields are left alone; an explicit
/// `clearPriceOverride` falls back to the product's base price.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantUpdate {
    #[serde(default)]
    pub price_override: Option<Price>,
    #[serde(default)]
    pub clear_price_override: bool,
    #[serde(default)]
    pub stock: Option<i32>,
}

impl VariantUpdate {
    /// # Errors
    ///
    /// Returns a message naming the first bad field.
    pub fn validate(&self) -> Result<(), String> {
        validate_stock_and_price(self.stock, self.price_override)
    }
}

/// Create/update body for a design.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignInput {
    pub name: String,
    pub image_url: String,
    pub price: Price,
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

impl DesignInput {
    /// # Errors
    ///
    /// Returns a message naming the first bad field.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() || self.image_url.trim().is_empty() {
            return Err("Name and image URL are required".to_owned());
        }
        if self.price.is_negative() {
            return Err("Price must not be negative".to_owned());
        }
        Ok(())
    }
}

fn validate_stock_and_price(stock: Option<i32>, price: Option<Price>) -> Result<(), String> {
    if stock.is_some_and(|s| s < 0) {
        return Err("Stock must not be negative".to_owned());
    }
    if price.is_some_and(|p| p.is_negative()) {
        return Err("Price must not be negative".to_owned());
    }
    Ok(())
}

fn is_slug(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= 100
        && !s.starts_with('-')
        && !s.ends_with('-')
        && s.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(slug: &str, price_cents: i64) -> ProductInput {
        ProductInput {
            slug: slug.to_owned(),
            title: "Classic Tee".to_owned(),
            description: String::new(),
            base_price: Price::from_cents(price_cents),
            image_url: None,
            customizable: true,
        }
    }

    #[test]
    fn test_product_input_validation() {
        assert!(product("classic-tee", 2_400).validate().is_ok());
        assert!(product("Classic Tee", 2_400).validate().is_err());
        assert!(product("-tee", 2_400).validate().is_err());
        assert!(product("tee", -1).validate().is_err());
    }

    #[test]
    fn test_variant_update_rejects_negative_stock() {
        let update = VariantUpdate {
            stock: Some(-2),
            ..VariantUpdate::default()
        };
        assert!(update.validate().is_err());
        assert!(VariantUpdate::default().validate().is_ok());
    }

    #[test]
    fn test_design_input_defaults_active() {
        let input: DesignInput =
            serde_json::from_str(r#"{"name":"Fern","imageUrl":"/d/fern.png","price":"6.00"}"#)
                .unwrap();
        assert!(input.active);
        assert!(input.validate().is_ok());
    }
}
