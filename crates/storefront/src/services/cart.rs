//! Cart mutations.
//!
//! Signed-in shoppers have a persisted cart; guests keep a
//! [`LocalCart`] in their session. Both paths validate the product and
//! variant against the catalog before anything is stored.

use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use threadline_core::guest_cart::{
    CustomizationData, ItemIdentity, LocalCart, LocalCartItem, MemoryStorage, StorageError,
};
use threadline_core::pricing::unit_price;
use threadline_core::{CustomizationId, Price, ProductId, UserId, VariantId};

use crate::db::carts::NewCartLine;
use crate::db::{
    CartRepository, CustomizationRepository, DesignRepository, ProductRepository,
    RepositoryError,
};
use crate::models::{CartSummary, Product, Variant};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("quantity is out of range")]
    InvalidQuantity,

    #[error("product not found")]
    ProductNotFound,

    #[error("product is not available")]
    ProductUnavailable,

    #[error("variant does not belong to product")]
    VariantMismatch,

    #[error("customization not found")]
    CustomizationNotFound,

    #[error("customization does not match this product")]
    CustomizationMismatch,

    #[error("design is not available")]
    DesignUnavailable,

    /// Unsaved customization data sent for a signed-in cart.
    #[error("customizations must be saved before adding to an account cart")]
    UnsavedCustomization,

    /// A saved customization id sent for a guest cart.
    #[error("saved customizations require an account")]
    SavedCustomizationForGuest,

    #[error("cart line not found")]
    LineNotFound,

    #[error("guest cart storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Most units of one variant a single add or update may ask for.
pub const MAX_LINE_QUANTITY: u32 = 999;

/// Largest amount a `NUMERIC(10, 2)` cart column holds.
const MAX_STORED_AMOUNT: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

impl CartError {
    /// Column overflows from merged quantities surface as a bad quantity.
    fn from_repository(err: RepositoryError) -> Self {
        if err.is_out_of_range() {
            Self::InvalidQuantity
        } else {
            Self::Repository(err)
        }
    }
}

/// Check a requested quantity against the per-request cap and the stored
/// line total.
///
/// # Errors
///
/// Returns `CartError::InvalidQuantity` if either limit is exceeded.
pub fn checked_line_quantity(quantity: u32, unit_price: Price) -> Result<i32, CartError> {
    if quantity > MAX_LINE_QUANTITY {
        return Err(CartError::InvalidQuantity);
    }
    let line_total = unit_price
        .amount()
        .checked_mul(Decimal::from(quantity))
        .ok_or(CartError::InvalidQuantity)?;
    if line_total > MAX_STORED_AMOUNT {
        return Err(CartError::InvalidQuantity);
    }
    i32::try_from(quantity).map_err(|_| CartError::InvalidQuantity)
}

/// What to put in a cart.
#[derive(Debug, Clone)]
pub struct CartAddition {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub quantity: u32,
    pub customization_id: Option<CustomizationId>,
    pub customization_data: Option<CustomizationData>,
}

/// Cart operations backed by the database.
pub struct CartService<'a> {
    pool: &'a PgPool,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Add to a signed-in user's cart.
    ///
    /// A zero quantity changes nothing and returns the current totals.
    ///
    /// # Errors
    ///
    /// Returns a `CartError` if the product, variant or customization does
    /// not check out.
    #[instrument(skip(self, addition), fields(product_id = %addition.product_id, variant_id = %addition.variant_id))]
    pub async fn add_for_user(
        &self,
        user_id: UserId,
        addition: &CartAddition,
    ) -> Result<CartSummary, CartError> {
        let carts = CartRepository::new(self.pool);
        let cart = carts.get_or_create(user_id).await?;
        if addition.quantity == 0 {
            return Ok(cart);
        }
        if addition.customization_data.is_some() {
            return Err(CartError::UnsavedCustomization);
        }

        if addition.quantity > MAX_LINE_QUANTITY {
            return Err(CartError::InvalidQuantity);
        }
        let (product, variant) = self
            .purchasable_variant(addition.product_id, addition.variant_id)
            .await?;

        let design_add_on = match addition.customization_id {
            Some(id) => Some(self.saved_design_price(user_id, id, &variant).await?),
            None => None,
        };

        let price = unit_price(product.base_price, variant.price_override, design_add_on);
        let line = NewCartLine {
            product_id: product.id,
            variant_id: variant.id,
            customization_id: addition.customization_id,
            quantity: checked_line_quantity(addition.quantity, price)?,
            unit_price: price,
        };

        carts
            .add_line(cart.id, &line)
            .await
            .map_err(CartError::from_repository)
    }

    /// Set the quantity of a signed-in user's cart line; zero or less removes it.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound` if the cart has no such line.
    pub async fn update_for_user(
        &self,
        user_id: UserId,
        identity: &ItemIdentity,
        quantity: i64,
    ) -> Result<CartSummary, CartError> {
        if identity.pending_design.is_some() {
            return Err(CartError::UnsavedCustomization);
        }
        if quantity > i64::from(MAX_LINE_QUANTITY) {
            return Err(CartError::InvalidQuantity);
        }
        let quantity = i32::try_from(quantity.max(0)).map_err(|_| CartError::InvalidQuantity)?;

        let carts = CartRepository::new(self.pool);
        let cart = carts.get_or_create(user_id).await?;

        carts
            .set_quantity(cart.id, identity.variant_id, identity.customization_id, quantity)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CartError::LineNotFound,
                other => CartError::from_repository(other),
            })
    }

    /// Remove a signed-in user's cart line. Absent lines are ignored.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if a query fails.
    pub async fn remove_for_user(
        &self,
        user_id: UserId,
        identity: &ItemIdentity,
    ) -> Result<CartSummary, CartError> {
        if identity.pending_design.is_some() {
            return Err(CartError::UnsavedCustomization);
        }

        let carts = CartRepository::new(self.pool);
        let cart = carts.get_or_create(user_id).await?;
        Ok(carts
            .remove_line(cart.id, identity.variant_id, identity.customization_id)
            .await?)
    }

    /// Add to a guest cart after checking the catalog.
    ///
    /// # Errors
    ///
    /// Returns a `CartError` if the product, variant or design does not
    /// check out, or if the cart cannot be saved.
    #[instrument(skip(self, cart, addition), fields(product_id = %addition.product_id, variant_id = %addition.variant_id))]
    pub async fn add_for_guest(
        &self,
        cart: &mut LocalCart<MemoryStorage>,
        addition: CartAddition,
    ) -> Result<(), CartError> {
        if addition.customization_id.is_some() {
            return Err(CartError::SavedCustomizationForGuest);
        }
        if addition.quantity > MAX_LINE_QUANTITY {
            return Err(CartError::InvalidQuantity);
        }

        let (product, variant) = self
            .purchasable_variant(addition.product_id, addition.variant_id)
            .await?;

        if let Some(data) = &addition.customization_data {
            if !product.customizable {
                return Err(CartError::CustomizationMismatch);
            }
            let design = DesignRepository::new(self.pool)
                .get(data.design_id)
                .await?
                .filter(|d| d.active)
                .ok_or(CartError::DesignUnavailable)?;
            tracing::debug!(design = %design.name, "Guest customization added");
        }

        let mut item = LocalCartItem::plain(product.id, product.slug, variant.id, addition.quantity);
        if let Some(data) = addition.customization_data {
            item = item.with_customization_data(data);
        }

        cart.add_item(item)?;
        Ok(())
    }

    /// Load an active product and one of its variants.
    async fn purchasable_variant(
        &self,
        product_id: ProductId,
        variant_id: VariantId,
    ) -> Result<(Product, Variant), CartError> {
        let products = ProductRepository::new(self.pool);

        let product = products
            .get_by_id(product_id)
            .await?
            .ok_or(CartError::ProductNotFound)?;
        if !product.is_purchasable() {
            return Err(CartError::ProductUnavailable);
        }

        let variant = products
            .get_variant(variant_id)
            .await?
            .filter(|v| v.product_id == product.id)
            .ok_or(CartError::VariantMismatch)?;

        Ok((product, variant))
    }

    /// Add-on price of a customization owned by `user_id` for `variant`.
    async fn saved_design_price(
        &self,
        user_id: UserId,
        customization_id: CustomizationId,
        variant: &Variant,
    ) -> Result<Price, CartError> {
        let customization = CustomizationRepository::new(self.pool)
            .get(customization_id)
            .await?
            .filter(|c| c.user_id == user_id)
            .ok_or(CartError::CustomizationNotFound)?;

        if customization.product_id != variant.product_id
            || customization.variant_id != variant.id
        {
            return Err(CartError::CustomizationMismatch);
        }

        let design = DesignRepository::new(self.pool)
            .get(customization.design_id)
            .await?
            .ok_or(CartError::DesignUnavailable)?;

        Ok(design.price)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_line_quantity_accepts_ordinary_lines() {
        assert_eq!(checked_line_quantity(3, Price::from_cents(2_400)).unwrap(), 3);
        assert_eq!(
            checked_line_quantity(MAX_LINE_QUANTITY, Price::from_cents(2_400)).unwrap(),
            999
        );
    }

    #[test]
    fn test_checked_line_quantity_rejects_huge_quantities() {
        let err = checked_line_quantity(2_000_000_000, Price::from_cents(2_400)).unwrap_err();
        assert!(matches!(err, CartError::InvalidQuantity));

        let err = checked_line_quantity(MAX_LINE_QUANTITY + 1, Price::from_cents(100)).unwrap_err();
        assert!(matches!(err, CartError::InvalidQuantity));
    }

    #[test]
    fn test_checked_line_quantity_rejects_unstorable_totals() {
        // 999 x 99,999,999.99 does not fit NUMERIC(10, 2).
        let err = checked_line_quantity(999, Price::from_cents(9_999_999_999)).unwrap_err();
        assert!(matches!(err, CartError::InvalidQuantity));
    }

    #[test]
    fn test_max_stored_amount() {
        assert_eq!(MAX_STORED_AMOUNT, Decimal::new(9_999_999_999, 2));
    }

    #[test]
    fn test_non_overflow_database_errors_stay_repository_errors() {
        let err = CartError::from_repository(RepositoryError::NotFound);
        assert!(matches!(err, CartError::Repository(RepositoryError::NotFound)));
    }
}
