//! Wishlist route handlers. Every route needs a signed-in user.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use threadline_core::{ActionResult, ProductId, UserId, VariantId};

use crate::db::wishlist::WishlistEntry;
use crate::db::{ProductRepository, WishlistRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::Product;
use crate::services::cart::{CartAddition, CartService};
use crate::state::AppState;

/// Body naming a product.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistForm {
    pub product_id: ProductId,
}

/// Body for moving a wishlist entry into the cart.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveToCartForm {
    pub product_id: ProductId,
    /// Variant to add; defaults to the first one in stock.
    #[serde(default)]
    pub variant_id: Option<VariantId>,
}

/// Whether a product is on the wishlist after a toggle.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistState {
    pub wishlisted: bool,
}

/// The user's wishlist, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<WishlistEntry>>> {
    let entries = WishlistRepository::new(state.pool()).list(user.id).await?;
    Ok(Json(entries))
}

/// Add a product. Adding twice is fine.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(form): Json<WishlistForm>,
) -> Result<Json<ActionResult>> {
    existing_product(&state, form.product_id).await?;
    WishlistRepository::new(state.pool())
        .add(user.id, form.product_id)
        .await?;

    Ok(Json(ActionResult::ok().with_message("Added to wishlist")))
}

/// Remove a product. Removing an absent product is fine.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(form): Json<WishlistForm>,
) -> Result<Json<ActionResult>> {
    WishlistRepository::new(state.pool())
        .remove(user.id, form.product_id)
        .await?;

    Ok(Json(ActionResult::ok().with_message("Removed from wishlist")))
}

/// Flip a product's wishlist membership.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn toggle(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(form): Json<WishlistForm>,
) -> Result<Json<ActionResult<WishlistState>>> {
    let wishlisted = toggle_entry(&state, user.id, form.product_id).await?;
    let message = if wishlisted {
        "Added to wishlist"
    } else {
        "Removed from wishlist"
    };

    Ok(Json(
        ActionResult::ok_with(WishlistState { wishlisted }).with_message(message),
    ))
}

/// Put one unit of a wishlisted product in the cart and drop the entry.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn move_to_cart(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(form): Json<MoveToCartForm>,
) -> Result<Json<ActionResult>> {
    let wishlist = WishlistRepository::new(state.pool());
    if !wishlist.contains(user.id, form.product_id).await? {
        return Err(AppError::NotFound(format!("wishlist item {}", form.product_id)));
    }

    let variant_id = match form.variant_id {
        Some(id) => id,
        None => ProductRepository::new(state.pool())
            .variants(form.product_id)
            .await?
            .iter()
            .find(|v| v.in_stock())
            .map(|v| v.id)
            .ok_or_else(|| AppError::BadRequest("This product is out of stock".to_owned()))?,
    };

    let addition = CartAddition {
        product_id: form.product_id,
        variant_id,
        quantity: 1,
        customization_id: None,
        customization_data: None,
    };
    CartService::new(state.pool())
        .add_for_user(user.id, &addition)
        .await?;
    wishlist.remove(user.id, form.product_id).await?;

    Ok(Json(ActionResult::ok().with_message("Moved to cart")))
}

async fn toggle_entry(state: &AppState, user_id: UserId, product_id: ProductId) -> Result<bool> {
    let wishlist = WishlistRepository::new(state.pool());
    if wishlist.remove(user_id, product_id).await? {
        return Ok(false);
    }

    existing_product(state, product_id).await?;
    wishlist.add(user_id, product_id).await?;
    Ok(true)
}

async fn existing_product(state: &AppState, product_id: ProductId) -> Result<Product> {
    ProductRepository::new(state.pool())
        .get_by_id(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))
}
