//! Checkout: summary and order placement.
//!
//! Placing an order is a single transaction. Variant rows are locked
//! `FOR UPDATE` in ID order, stock is checked and decremented, the order
//! is written with snapshots of the address and every line, and the cart
//! is emptied. Any failure rolls the whole thing back.

use std::collections::BTreeMap;

use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use threadline_core::pricing::{CartTotals, ShippingPolicy};
use threadline_core::{AddressId, Price, ProductStatus, UserId, VariantId, new_order_number};

use crate::db::orders::{self, LockedVariant, NewOrder, NewOrderItem};
use crate::db::{AddressRepository, CartRepository, RepositoryError, addresses, carts};
use crate::models::{
    Address, AddressSnapshot, CartLine, CartView, CustomizationSnapshot, OrderDetail,
};

/// Longest accepted order note.
pub const MAX_NOTE_LENGTH: usize = 500;

/// Errors from checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("address not found")]
    AddressNotFound,

    #[error("{title} is no longer available")]
    ProductUnavailable { title: String },

    #[error("not enough stock for {sku}")]
    OutOfStock { sku: String },

    #[error("note is longer than {MAX_NOTE_LENGTH} characters")]
    NoteTooLong,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

/// Everything the checkout page shows.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSummary {
    pub cart: CartView,
    pub addresses: Vec<Address>,
    pub subtotal: Price,
    pub shipping: Price,
    pub total: Price,
    pub free_shipping_threshold: Price,
}

/// Checkout operations.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    shipping: ShippingPolicy,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, shipping: ShippingPolicy) -> Self {
        Self { pool, shipping }
    }

    /// Cart, saved addresses and the shipping quote.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Repository` if a query fails.
    pub async fn summary(&self, user_id: UserId) -> Result<CheckoutSummary, CheckoutError> {
        let cart = CartRepository::new(self.pool).view(user_id).await?;
        let addresses = AddressRepository::new(self.pool).list(user_id).await?;

        let totals = totals(&cart.lines);
        let shipping = self.shipping.quote(&totals);

        Ok(CheckoutSummary {
            subtotal: totals.subtotal,
            shipping,
            total: totals.subtotal + shipping,
            free_shipping_threshold: self.shipping.free_threshold,
            cart,
            addresses,
        })
    }

    /// Turn the user's cart into a `pending` order.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart`, `AddressNotFound`,
    /// `ProductUnavailable` or `OutOfStock` when the order cannot be placed.
    #[instrument(skip(self, note))]
    pub async fn place_order(
        &self,
        user_id: UserId,
        address_id: AddressId,
        note: Option<&str>,
    ) -> Result<OrderDetail, CheckoutError> {
        let note = note.map(str::trim).filter(|n| !n.is_empty());
        if note.is_some_and(|n| n.chars().count() > MAX_NOTE_LENGTH) {
            return Err(CheckoutError::NoteTooLong);
        }

        let cart = CartRepository::new(self.pool).get_or_create(user_id).await?;

        let mut tx = self.pool.begin().await?;

        let address = addresses::get_for_user(&mut tx, user_id, address_id)
            .await?
            .ok_or(CheckoutError::AddressNotFound)?;

        let lines = carts::load_lines(&mut *tx, cart.id).await?;
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        if let Some(line) = lines
            .iter()
            .find(|l| l.product_status != ProductStatus::Active)
        {
            return Err(CheckoutError::ProductUnavailable {
                title: line.product_title.clone(),
            });
        }

        let needed = quantities_by_variant(&lines);
        let variant_ids: Vec<VariantId> = needed.keys().copied().collect();
        let locked = orders::lock_variants(&mut tx, &variant_ids).await?;
        if let Some(sku) = first_shortfall(&lines, &needed, &locked) {
            return Err(CheckoutError::OutOfStock { sku });
        }

        for (variant_id, quantity) in &needed {
            orders::decrement_stock(&mut tx, *variant_id, *quantity).await?;
        }

        let totals = totals(&lines);
        let shipping = self.shipping.quote(&totals);
        let order_number = new_order_number();
        let snapshot = AddressSnapshot::from(&address);

        let order = orders::insert_order(
            &mut tx,
            &NewOrder {
                user_id,
                order_number: &order_number,
                subtotal: totals.subtotal,
                shipping,
                total: totals.subtotal + shipping,
                shipping_address: &snapshot,
                note,
            },
        )
        .await?;

        for line in &lines {
            orders::insert_item(&mut tx, order.id, &order_item(line)).await?;
        }

        carts::clear_lines(&mut tx, cart.id).await?;
        let items = orders::items(&mut tx, order.id).await?;

        tx.commit().await?;

        tracing::info!(
            order_number = %order.order_number,
            total = %order.total.amount(),
            "Order placed"
        );

        Ok(OrderDetail { order, items })
    }
}

/// Totals over cart lines.
fn totals(lines: &[CartLine]) -> CartTotals {
    CartTotals::from_lines(
        lines
            .iter()
            .map(|l| (l.unit_price, u32::try_from(l.quantity).unwrap_or_default())),
    )
}

/// Units needed per variant. One variant can appear on several lines with
/// different customizations.
fn quantities_by_variant(lines: &[CartLine]) -> BTreeMap<VariantId, i32> {
    lines.iter().fold(BTreeMap::new(), |mut acc, line| {
        *acc.entry(line.variant_id).or_insert(0) += line.quantity;
        acc
    })
}

/// SKU of the first cart line whose variant lacks stock.
fn first_shortfall(
    lines: &[CartLine],
    needed: &BTreeMap<VariantId, i32>,
    locked: &[LockedVariant],
) -> Option<String> {
    lines.iter().find_map(|line| {
        let need = needed.get(&line.variant_id).copied().unwrap_or(line.quantity);
        match locked.iter().find(|v| v.id == line.variant_id) {
            Some(variant) if variant.stock >= need => None,
            Some(variant) => Some(variant.sku.clone()),
            None => Some(line.sku.clone()),
        }
    })
}

/// Snapshot a cart line onto an order line.
fn order_item(line: &CartLine) -> NewOrderItem {
    let customization = match (
        line.design_id,
        &line.design_name,
        &line.thread_color_hex,
        line.position,
    ) {
        (Some(design_id), Some(design_name), Some(thread_color_hex), Some(position)) => {
            Some(CustomizationSnapshot {
                design_id,
                design_name: design_name.clone(),
                thread_color_hex: thread_color_hex.clone(),
                position,
            })
        }
        _ => None,
    };

    NewOrderItem {
        product_id: line.product_id,
        variant_id: line.variant_id,
        product_title: line.product_title.clone(),
        variant_label: line.variant_label(),
        customization,
        quantity: line.quantity,
        unit_price: line.unit_price,
        line_total: line.line_total,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use threadline_core::{CartItemId, CustomizationId, DesignId, Placement, ProductId};

    use super::*;

    fn line(id: i32, variant: i32, quantity: i32, cents: i64) -> CartLine {
        let unit_price = Price::from_cents(cents);
        CartLine {
            id: CartItemId::new(id),
            product_id: ProductId::new(1),
            product_slug: "field-tee".to_owned(),
            product_title: "Field Tee".to_owned(),
            product_status: ProductStatus::Active,
            variant_id: VariantId::new(variant),
            sku: format!("TEE-{variant}"),
            size: "M".to_owned(),
            color: "Navy".to_owned(),
            stock: 10,
            customization_id: None,
            design_id: None,
            design_name: None,
            thread_color_hex: None,
            position: None,
            quantity,
            unit_price,
            line_total: unit_price.times(u32::try_from(quantity).unwrap()),
        }
    }

    fn locked(variant: i32, stock: i32) -> LockedVariant {
        LockedVariant {
            id: VariantId::new(variant),
            sku: format!("TEE-{variant}"),
            stock,
        }
    }

    #[test]
    fn test_quantities_sum_across_customizations() {
        let lines = [line(1, 5, 2, 2000), line(2, 5, 3, 2600), line(3, 6, 1, 2000)];
        let needed = quantities_by_variant(&lines);
        assert_eq!(needed.get(&VariantId::new(5)), Some(&5));
        assert_eq!(needed.get(&VariantId::new(6)), Some(&1));
    }

    #[test]
    fn test_first_shortfall_uses_combined_quantity() {
        let lines = [line(1, 5, 2, 2000), line(2, 5, 3, 2600)];
        let needed = quantities_by_variant(&lines);

        assert_eq!(first_shortfall(&lines, &needed, &[locked(5, 5)]), None);
        assert_eq!(
            first_shortfall(&lines, &needed, &[locked(5, 4)]).as_deref(),
            Some("TEE-5")
        );
    }

    #[test]
    fn test_first_shortfall_reports_cart_order() {
        let lines = [line(1, 9, 1, 2000), line(2, 3, 1, 2000)];
        let needed = quantities_by_variant(&lines);
        let sku = first_shortfall(&lines, &needed, &[locked(3, 0), locked(9, 0)]);
        assert_eq!(sku.as_deref(), Some("TEE-9"));
    }

    #[test]
    fn test_totals() {
        let lines = [line(1, 5, 2, 2000), line(2, 6, 1, 550)];
        let totals = totals(&lines);
        assert_eq!(totals.subtotal, Price::from_cents(4550));
        assert_eq!(totals.item_count, 3);
    }

    #[test]
    fn test_order_item_snapshots_customization() {
        let mut custom = line(1, 5, 1, 2600);
        custom.customization_id = Some(CustomizationId::new(4));
        custom.design_id = Some(DesignId::new(2));
        custom.design_name = Some("Pine".to_owned());
        custom.thread_color_hex = Some("#1B4D3E".to_owned());
        custom.position = Some(Placement::LeftChest);

        let item = order_item(&custom);
        assert_eq!(item.variant_label, "M / Navy");
        let snapshot = item.customization.unwrap();
        assert_eq!(snapshot.design_name, "Pine");
        assert_eq!(snapshot.position, Placement::LeftChest);

        assert!(order_item(&line(2, 5, 1, 2000)).customization.is_none());
    }
}
