//! Catalog types: products, variants and embroidery designs.

use chrono::{DateTime, Utc};
use serde::Serialize;

use threadline_core::pricing::unit_price;
use threadline_core::{DesignId, Price, ProductId, ProductStatus, VariantId};

/// A product row.
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

impl Product {
    /// Whether shoppers may see and buy the product.
    #[must_use]
    pub fn is_purchasable(&self) -> bool {
        self.status == ProductStatus::Active
    }
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

impl Variant {
    /// Human label, e.g. `M / Heather Grey`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} / {}", self.size, self.color)
    }

    /// Whether at least one unit is on hand.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// A variant with its effective price resolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantView {
    pub id: VariantId,
    pub sku: String,
    pub size: String,
    pub color: String,
    pub price: Price,
    pub in_stock: bool,
}

impl VariantView {
    #[must_use]
    pub fn new(variant: &Variant, base_price: Price) -> Self {
        Self {
            id: variant.id,
            sku: variant.sku.clone(),
            size: variant.size.clone(),
            color: variant.color.clone(),
            price: unit_price(base_price, variant.price_override, None),
            in_stock: variant.in_stock(),
        }
    }
}

/// Product detail page payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub variants: Vec<VariantView>,
}

impl ProductDetail {
    #[must_use]
    pub fn new(product: Product, variants: &[Variant]) -> Self {
        let variants = variants
            .iter()
            .map(|v| VariantView::new(v, product.base_price))
            .collect();
        Self { product, variants }
    }
}

/// One page of the catalog listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

impl ProductPage {
    /// Whether a later page exists.
    #[must_use]
    pub fn has_next(&self) -> bool {
        i64::from(self.page) * i64::from(self.per_page) < self.total
    }
}

/// An embroidery design.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Design {
    pub id: DesignId,
    pub name: String,
    pub image_url: String,
    pub price: Price,
    pub active: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn variant(price_override: Option<Price>, stock: i32) -> Variant {
        Variant {
            id: VariantId::new(1),
            product_id: ProductId::new(1),
            sku: "TEE-M-BLK".to_owned(),
            size: "M".to_owned(),
            color: "Black".to_owned(),
            price_override,
            stock,
        }
    }

    #[test]
    fn test_variant_view_prices() {
        let base = Price::from_cents(2_400);
        assert_eq!(VariantView::new(&variant(None, 3), base).price, base);
        let view = VariantView::new(&variant(Some(Price::from_cents(2_600)), 0), base);
        assert_eq!(view.price, Price::from_cents(2_600));
        assert!(!view.in_stock);
    }

    #[test]
    fn test_label() {
        assert_eq!(variant(None, 0).label(), "M / Black");
    }

    #[test]
    fn test_has_next() {
        let page = |page, total| ProductPage {
            products: Vec::new(),
            page,
            per_page: 24,
            total,
        };
        assert!(page(1, 25).has_next());
        assert!(!page(1, 24).has_next());
        assert!(!page(2, 30).has_next());
    }
}
