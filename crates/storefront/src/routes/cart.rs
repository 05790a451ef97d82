//! Cart route handlers.
//!
//! Signed-in shoppers work against their persisted cart. Guests get the
//! same endpoints backed by the cart document in their session.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use threadline_core::guest_cart::{CustomizationData, GuestCart, ItemIdentity, LocalCartItem};
use threadline_core::{
    ActionResult, CustomizationId, DesignId, ProductId, ThreadColor, VariantId,
};

use crate::db::CartRepository;
use crate::error::{AppError, Result};
use crate::middleware::{OptionalUser, discard_guest_cart, load_guest_cart, store_guest_cart};
use crate::models::{CartSummary, CartView};
use crate::services::cart::{CartAddition, CartError, CartService};
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Add to cart body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartForm {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub customization_id: Option<CustomizationId>,
    #[serde(default)]
    pub customization_data: Option<CustomizationData>,
}

const fn default_quantity() -> u32 {
    1
}

impl From<AddToCartForm> for CartAddition {
    fn from(form: AddToCartForm) -> Self {
        Self {
            product_id: form.product_id,
            variant_id: form.variant_id,
            quantity: form.quantity,
            customization_id: form.customization_id,
            customization_data: form.customization_data,
        }
    }
}

/// Identifies one cart line.
///
/// Guest lines with unsaved customizations are addressed by their
/// `designId` + `threadColorHex` pair.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRef {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    #[serde(default)]
    pub customization_id: Option<CustomizationId>,
    #[serde(default)]
    pub design_id: Option<DesignId>,
    #[serde(default)]
    pub thread_color_hex: Option<String>,
}

impl LineRef {
    fn identity(&self) -> Result<ItemIdentity> {
        let pending_design = match (self.design_id, self.thread_color_hex.as_deref()) {
            (Some(design_id), Some(hex)) => {
                let color = ThreadColor::parse(hex)
                    .map_err(|e| AppError::BadRequest(format!("Invalid thread color: {e}")))?;
                Some((design_id, color))
            }
            (None, None) => None,
            _ => {
                return Err(AppError::BadRequest(
                    "designId and threadColorHex go together".to_owned(),
                ));
            }
        };

        Ok(ItemIdentity {
            product_id: self.product_id,
            variant_id: self.variant_id,
            customization_id: self.customization_id,
            pending_design,
        })
    }
}

/// Update quantity body. Zero or less removes the line.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    #[serde(flatten)]
    pub line: LineRef,
    pub quantity: i64,
}

// =============================================================================
// Response Types
// =============================================================================

/// A guest cart as shown to the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestCartView {
    pub items: Vec<LocalCartItem>,
    pub item_count: u64,
    pub last_modified: DateTime<Utc>,
}

impl From<GuestCart> for GuestCartView {
    fn from(cart: GuestCart) -> Self {
        Self {
            item_count: cart.item_count(),
            items: cart.items,
            last_modified: cart.last_modified,
        }
    }
}

/// Either kind of cart, tagged with `kind`.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CartResponse {
    Guest(GuestCartView),
    Account(CartView),
}

/// Cart badge count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCount {
    pub item_count: i64,
}

impl CartCount {
    fn guest(count: u64) -> Self {
        Self {
            item_count: i64::try_from(count).unwrap_or(i64::MAX),
        }
    }

    fn account(summary: &CartSummary) -> Self {
        Self {
            item_count: i64::from(summary.item_count),
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Show the current cart.
#[instrument(skip(state, user, session))]
pub async fn show(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    session: Session,
) -> Result<Json<CartResponse>> {
    if let Some(user) = user {
        let cart = CartRepository::new(state.pool()).view(user.id).await?;
        return Ok(Json(CartResponse::Account(cart)));
    }

    let cart = load_guest_cart(&session).await?;
    Ok(Json(CartResponse::Guest(cart.get_cart().into())))
}

/// Add an item to the cart.
#[instrument(skip(state, user, session, form))]
pub async fn add(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    session: Session,
    Json(form): Json<AddToCartForm>,
) -> Result<Json<ActionResult<CartCount>>> {
    let service = CartService::new(state.pool());
    let addition = CartAddition::from(form);

    let count = if let Some(user) = user {
        let summary = service.add_for_user(user.id, &addition).await?;
        CartCount::account(&summary)
    } else {
        let mut cart = load_guest_cart(&session).await?;
        service.add_for_guest(&mut cart, addition).await?;
        let count = CartCount::guest(cart.get_item_count());
        store_guest_cart(&session, cart).await?;
        count
    };

    Ok(Json(
        ActionResult::ok_with(count).with_message("Added to cart"),
    ))
}

/// Set a line's quantity.
#[instrument(skip(state, user, session, form))]
pub async fn update(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    session: Session,
    Json(form): Json<UpdateCartForm>,
) -> Result<Json<ActionResult<CartCount>>> {
    let identity = form.line.identity()?;

    let count = if let Some(user) = user {
        let summary = CartService::new(state.pool())
            .update_for_user(user.id, &identity, form.quantity)
            .await?;
        CartCount::account(&summary)
    } else {
        let mut cart = load_guest_cart(&session).await?;
        let updated = cart
            .update_item(&identity, form.quantity)
            .map_err(CartError::from)?;
        store_guest_cart(&session, cart).await?;
        CartCount::guest(updated.item_count())
    };

    Ok(Json(ActionResult::ok_with(count)))
}

/// Remove a line. Removing an absent line is not an error.
#[instrument(skip(state, user, session, line))]
pub async fn remove(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    session: Session,
    Json(line): Json<LineRef>,
) -> Result<Json<ActionResult<CartCount>>> {
    let identity = line.identity()?;

    let count = if let Some(user) = user {
        let summary = CartService::new(state.pool())
            .remove_for_user(user.id, &identity)
            .await?;
        CartCount::account(&summary)
    } else {
        let mut cart = load_guest_cart(&session).await?;
        let updated = cart
            .remove_item(&identity)
            .map_err(CartError::from)?;
        store_guest_cart(&session, cart).await?;
        CartCount::guest(updated.item_count())
    };

    Ok(Json(
        ActionResult::ok_with(count).with_message("Removed from cart"),
    ))
}

/// Empty the cart.
#[instrument(skip(state, user, session))]
pub async fn clear(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    session: Session,
) -> Result<Json<ActionResult<CartCount>>> {
    let count = if let Some(user) = user {
        let carts = CartRepository::new(state.pool());
        let cart = carts.get_or_create(user.id).await?;
        CartCount::account(&carts.clear(cart.id).await?)
    } else {
        let mut cart = load_guest_cart(&session).await?;
        cart.clear().map_err(CartError::from)?;
        store_guest_cart(&session, cart).await?;
        CartCount::guest(0)
    };

    Ok(Json(ActionResult::ok_with(count).with_message("Cart cleared")))
}

/// Item count for the cart badge.
#[instrument(skip(state, user, session))]
pub async fn count(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    session: Session,
) -> Result<Json<CartCount>> {
    let count = if let Some(user) = user {
        let count = CartRepository::new(state.pool()).item_count(user.id).await?;
        CartCount {
            item_count: i64::from(count),
        }
    } else {
        CartCount::guest(load_guest_cart(&session).await?.get_item_count())
    };

    Ok(Json(count))
}

/// Raw guest cart items, for a client that wants to sync them after login.
///
/// Sign-in leaves the guest cart in the session, so a signed-in shopper
/// still sees what they added as a guest until it is discarded.
#[instrument(skip(session))]
pub async fn export(session: Session) -> Result<Json<Vec<LocalCartItem>>> {
    let cart = load_guest_cart(&session).await?;
    Ok(Json(cart.export_for_sync()))
}

/// Drop the exported guest cart once the client has synced it.
#[instrument(skip(session))]
pub async fn discard_export(session: Session) -> Result<Json<ActionResult>> {
    discard_guest_cart(&session).await?;
    Ok(Json(ActionResult::ok().with_message("Guest cart discarded")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(json: &str) -> LineRef {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_add_form_defaults_quantity_to_one() {
        let form: AddToCartForm = serde_json::from_str(r#"{"productId":1,"variantId":2}"#).unwrap();
        assert_eq!(form.quantity, 1);
        assert!(form.customization_id.is_none());
    }

    #[test]
    fn test_line_ref_plain_identity() {
        let identity = line(r#"{"productId":1,"variantId":2}"#).identity().unwrap();
        assert_eq!(
            identity,
            ItemIdentity::plain(ProductId::new(1), VariantId::new(2))
        );
    }

    #[test]
    fn test_line_ref_pending_design_normalizes_color() {
        let identity = line(r##"{"productId":1,"variantId":2,"designId":5,"threadColorHex":"#c8102e"}"##)
            .identity()
            .unwrap();
        let (design, color) = identity.pending_design.unwrap();
        assert_eq!(design, DesignId::new(5));
        assert_eq!(color.to_string(), "#C8102E");
    }

    #[test]
    fn test_line_ref_rejects_half_a_design() {
        let err = line(r#"{"productId":1,"variantId":2,"designId":5}"#)
            .identity()
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = line(r#"{"productId":1,"variantId":2,"designId":5,"threadColorHex":"red"}"#)
            .identity()
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_update_form_flattens_line() {
        let form: UpdateCartForm =
            serde_json::from_str(r#"{"productId":1,"variantId":2,"quantity":0}"#).unwrap();
        assert_eq!(form.quantity, 0);
        assert_eq!(form.line.variant_id, VariantId::new(2));
    }

    #[test]
    fn test_guest_cart_response_shape() {
        let mut cart = GuestCart::default();
        cart.add_item(LocalCartItem::plain(ProductId::new(1), "tee", VariantId::new(2), 3));
        let json = serde_json::to_value(CartResponse::Guest(cart.into())).unwrap();
        assert_eq!(json["kind"], "guest");
        assert_eq!(json["itemCount"], 3);
        assert_eq!(json["items"][0]["productSlug"], "tee");
    }

    #[tokio::test]
    async fn test_discard_export_empties_guest_cart() {
        let session = Session::new(
            None,
            std::sync::Arc::new(tower_sessions::MemoryStore::default()),
            None,
        );
        let mut cart = load_guest_cart(&session).await.unwrap();
        cart.add_item(LocalCartItem::plain(ProductId::new(1), "tee", VariantId::new(2), 1))
            .unwrap();
        store_guest_cart(&session, cart).await.unwrap();

        let Json(before) = export(session.clone()).await.unwrap();
        assert_eq!(before.len(), 1);

        let Json(result) = discard_export(session.clone()).await.unwrap();
        assert!(result.success);

        let Json(after) = export(session).await.unwrap();
        assert!(after.is_empty());
    }
}
