//! Guest cart: pending cart lines for shoppers who are not signed in.
//!
//! The cart is a flat list of [`LocalCartItem`]s. Adding an item that is
//! "the same" as an existing one grows the existing quantity instead of
//! appending a duplicate row. Two items are the same when product and
//! variant match and their customizations agree under the rule in
//! [`ItemIdentity::matches`].
//!
//! [`GuestCart`] holds the pure list operations. [`LocalCart`] wraps them in
//! read-modify-write cycles against a [`CartStorage`] slot.

mod storage;

pub use storage::{CartStorage, LocalCart, MemoryStorage, StorageError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CustomizationId, DesignId, Placement, ProductId, ThreadColor, VariantId};

/// A customization picked by a guest that has not been saved server-side yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomizationData {
    pub design_id: DesignId,
    pub thread_color_hex: ThreadColor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Placement>,
}

/// One line of the guest cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalCartItem {
    pub product_id: ProductId,
    pub product_slug: String,
    pub variant_id: VariantId,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization_id: Option<CustomizationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization_data: Option<CustomizationData>,
}

impl LocalCartItem {
    /// An uncustomized line.
    #[must_use]
    pub fn plain(
        product_id: ProductId,
        product_slug: impl Into<String>,
        variant_id: VariantId,
        quantity: u32,
    ) -> Self {
        Self {
            product_id,
            product_slug: product_slug.into(),
            variant_id,
            quantity,
            customization_id: None,
            customization_data: None,
        }
    }

    /// Attach a saved customization.
    #[must_use]
    pub const fn with_customization_id(mut self, id: CustomizationId) -> Self {
        self.customization_id = Some(id);
        self
    }

    /// Attach an unsaved guest customization.
    #[must_use]
    pub fn with_customization_data(mut self, data: CustomizationData) -> Self {
        self.customization_data = Some(data);
        self
    }

    /// The identity used to find this line in a cart.
    #[must_use]
    pub fn identity(&self) -> ItemIdentity {
        ItemIdentity {
            product_id: self.product_id,
            variant_id: self.variant_id,
            customization_id: self.customization_id,
            pending_design: self
                .customization_data
                .as_ref()
                .map(|data| (data.design_id, data.thread_color_hex.clone())),
        }
    }
}

/// The lookup key of a cart line.
///
/// `pending_design` is the `(designId, threadColorHex)` pair of unsaved
/// customization data; preview image and position do not take part in
/// matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemIdentity {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    #[serde(default)]
    pub customization_id: Option<CustomizationId>,
    #[serde(default)]
    pub pending_design: Option<(DesignId, ThreadColor)>,
}

impl ItemIdentity {
    /// Identity of an uncustomized line.
    #[must_use]
    pub const fn plain(product_id: ProductId, variant_id: VariantId) -> Self {
        Self {
            product_id,
            variant_id,
            customization_id: None,
            pending_design: None,
        }
    }

    /// Whether this identity has neither a saved nor a pending customization.
    #[must_use]
    pub const fn is_uncustomized(&self) -> bool {
        self.customization_id.is_none() && self.pending_design.is_none()
    }

    /// Whether two lines are the same cart line.
    ///
    /// Product and variant must match, and then one of:
    /// 1. both carry the same saved customization id,
    /// 2. both carry pending data with equal design and thread color,
    /// 3. neither carries any customization.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        if self.product_id != other.product_id || self.variant_id != other.variant_id {
            return false;
        }

        let same_saved = matches!(
            (self.customization_id, other.customization_id),
            (Some(a), Some(b)) if a == b
        );
        let same_pending = matches!(
            (&self.pending_design, &other.pending_design),
            (Some(a), Some(b)) if a == b
        );

        same_saved || same_pending || (self.is_uncustomized() && other.is_uncustomized())
    }
}

/// The stored guest cart document.
///
/// Serialized as `{ "items": [...], "lastModified": "..." }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestCart {
    pub items: Vec<LocalCartItem>,
    pub last_modified: DateTime<Utc>,
}

impl GuestCart {
    /// Parse a stored document.
    ///
    /// # Errors
    ///
    /// Returns the JSON error when the document is malformed or any item
    /// fails validation (for example an invalid thread color).
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        let mut cart: Self = serde_json::from_str(raw)?;
        cart.items.retain(|item| item.quantity > 0);
        Ok(cart)
    }

    /// Parse stored content, falling back to an empty cart.
    ///
    /// Missing or unreadable content is treated as "no cart yet".
    #[must_use]
    pub fn from_storage(raw: Option<&str>) -> Self {
        raw.and_then(|raw| Self::parse(raw).ok()).unwrap_or_default()
    }

    /// Serialize for storage.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Add a line, merging with an equivalent existing line.
    ///
    /// Adding a zero quantity leaves the cart unchanged.
    pub fn add_item(&mut self, item: LocalCartItem) {
        if item.quantity == 0 {
            return;
        }

        let identity = item.identity();
        match self.find_mut(&identity) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(item.quantity);
            }
            None => self.items.push(item),
        }
    }

    /// Set the quantity of a line; a quantity of zero or less removes it.
    ///
    /// Returns whether a matching line was found.
    pub fn update_item(&mut self, identity: &ItemIdentity, quantity: i64) -> bool {
        if quantity <= 0 {
            return self.remove_item(identity) > 0;
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        match self.find_mut(identity) {
            Some(existing) => {
                existing.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Remove every line matching `identity`; returns how many were removed.
    pub fn remove_item(&mut self, identity: &ItemIdentity) -> usize {
        let before = self.items.len();
        self.items.retain(|item| !item.identity().matches(identity));
        before - self.items.len()
    }

    /// Total quantity across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Whether a matching line exists.
    #[must_use]
    pub fn has_item(&self, identity: &ItemIdentity) -> bool {
        self.find(identity).is_some()
    }

    /// Quantity of the matching line, or 0.
    #[must_use]
    pub fn item_quantity(&self, identity: &ItemIdentity) -> u32 {
        self.find(identity).map_or(0, |item| item.quantity)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn find(&self, identity: &ItemIdentity) -> Option<&LocalCartItem> {
        self.items
            .iter()
            .find(|item| item.identity().matches(identity))
    }

    fn find_mut(&mut self, identity: &ItemIdentity) -> Option<&mut LocalCartItem> {
        self.items
            .iter_mut()
            .find(|item| item.identity().matches(identity))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn tee(quantity: u32) -> LocalCartItem {
        LocalCartItem::plain(ProductId::new(1), "classic-tee", VariantId::new(10), quantity)
    }

    fn pending(design: i32, hex: &str) -> CustomizationData {
        CustomizationData {
            design_id: DesignId::new(design),
            thread_color_hex: ThreadColor::parse(hex).unwrap(),
            preview_image: None,
            position: Some(Placement::LeftChest),
        }
    }

    #[test]
    fn test_identity_requires_same_product_and_variant() {
        let a = tee(1).identity();
        let mut b = a.clone();
        b.variant_id = VariantId::new(11);
        assert!(!a.matches(&b));
    }

    #[test]
    fn test_identity_saved_customization() {
        let a = tee(1).with_customization_id(CustomizationId::new(5)).identity();
        let b = tee(1).with_customization_id(CustomizationId::new(5)).identity();
        let c = tee(1).with_customization_id(CustomizationId::new(6)).identity();
        assert!(a.matches(&b));
        assert!(!a.matches(&c));
    }

    #[test]
    fn test_identity_pending_ignores_preview_and_position() {
        let mut other = pending(3, "#ff0000");
        other.preview_image = Some("https://cdn.example/preview.png".to_owned());
        other.position = Some(Placement::Back);

        let a = tee(1).with_customization_data(pending(3, "#FF0000")).identity();
        let b = tee(1).with_customization_data(other).identity();
        assert!(a.matches(&b));
    }

    #[test]
    fn test_identity_customized_never_matches_plain() {
        let plain = tee(1).identity();
        let saved = tee(1).with_customization_id(CustomizationId::new(5)).identity();
        let unsaved = tee(1).with_customization_data(pending(3, "#000000")).identity();
        assert!(!plain.matches(&saved));
        assert!(!plain.matches(&unsaved));
        assert!(!saved.matches(&unsaved));
    }

    #[test]
    fn test_add_twice_merges_quantities() {
        let mut cart = GuestCart::default();
        cart.add_item(tee(2));
        cart.add_item(tee(3));
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 5);
    }

    #[test]
    fn test_add_different_designs_keeps_two_lines() {
        let mut cart = GuestCart::default();
        cart.add_item(tee(1).with_customization_data(pending(3, "#FF0000")));
        cart.add_item(tee(1).with_customization_data(pending(3, "#0000FF")));
        cart.add_item(tee(1).with_customization_data(pending(4, "#FF0000")));
        assert_eq!(cart.items.len(), 3);
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_add_zero_quantity_is_ignored() {
        let mut cart = GuestCart::default();
        cart.add_item(tee(0));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_to_zero_removes() {
        let mut cart = GuestCart::default();
        cart.add_item(tee(4));
        let identity = tee(1).identity();
        assert!(cart.update_item(&identity, 0));
        assert!(!cart.has_item(&identity));
        assert_eq!(cart.item_quantity(&identity), 0);
    }

    #[test]
    fn test_update_missing_line_reports_false() {
        let mut cart = GuestCart::default();
        assert!(!cart.update_item(&tee(1).identity(), 3));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut cart = GuestCart::default();
        cart.add_item(tee(1));
        let other = ItemIdentity::plain(ProductId::new(99), VariantId::new(99));
        assert_eq!(cart.remove_item(&other), 0);
        assert_eq!(cart.remove_item(&other), 0);
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn test_document_uses_camel_case() {
        let mut cart = GuestCart::default();
        cart.add_item(tee(1).with_customization_data(pending(3, "#ff0000")));
        let json = cart.to_json().unwrap();
        assert!(json.contains("\"productSlug\":\"classic-tee\""));
        assert!(json.contains("\"threadColorHex\":\"#FF0000\""));
        assert!(json.contains("\"lastModified\""));
        assert!(!json.contains("customizationId"));
    }

    #[test]
    fn test_from_storage_falls_back_to_empty() {
        assert!(GuestCart::from_storage(None).is_empty());
        assert!(GuestCart::from_storage(Some("{not json")).is_empty());
        assert!(GuestCart::from_storage(Some("[]")).is_empty());

        let bad_color = r##"{"items":[{"productId":1,"productSlug":"t","variantId":2,"quantity":1,
            "customizationData":{"designId":3,"threadColorHex":"red"}}],
            "lastModified":"2026-01-01T00:00:00Z"}"##;
        assert!(GuestCart::from_storage(Some(bad_color)).is_empty());
    }

    #[test]
    fn test_parse_drops_zero_quantity_lines() {
        let raw = r#"{"items":[{"productId":1,"productSlug":"t","variantId":2,"quantity":0}],
            "lastModified":"2026-01-01T00:00:00Z"}"#;
        assert!(GuestCart::parse(raw).unwrap().is_empty());
    }
}
