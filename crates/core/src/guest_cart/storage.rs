//! Storage-backed guest cart manager.

use chrono::Utc;

use super::{GuestCart, ItemIdentity, LocalCartItem};

/// Errors raised when writing the guest cart back to storage.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The cart could not be serialized.
    #[error("failed to encode guest cart: {0}")]
    Encode(#[from] serde_json::Error),
    /// The backend refused the write.
    #[error("guest cart storage unavailable: {0}")]
    Backend(String),
}

/// A single string slot holding the serialized guest cart.
///
/// Reads never fail: an unavailable backend reads as "nothing stored".
pub trait CartStorage {
    /// The raw stored document, if any.
    fn load(&self) -> Option<String>;

    /// Replace the stored document.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Backend`] if the backend refuses the write.
    fn store(&mut self, raw: String) -> Result<(), StorageError>;

    /// Remove the stored document.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Backend`] if the backend refuses the write.
    fn clear(&mut self) -> Result<(), StorageError>;
}

/// In-process storage slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStorage {
    raw: Option<String>,
}

impl MemoryStorage {
    /// An empty slot.
    #[must_use]
    pub const fn new() -> Self {
        Self { raw: None }
    }

    /// A slot pre-filled with previously stored content.
    #[must_use]
    pub const fn with_contents(raw: Option<String>) -> Self {
        Self { raw }
    }

    /// Take the current content out of the slot.
    #[must_use]
    pub fn into_contents(self) -> Option<String> {
        self.raw
    }
}

impl CartStorage for MemoryStorage {
    fn load(&self) -> Option<String> {
        self.raw.clone()
    }

    fn store(&mut self, raw: String) -> Result<(), StorageError> {
        self.raw = Some(raw);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.raw = None;
        Ok(())
    }
}

/// Guest cart manager over an explicit storage backend.
///
/// Every mutation is a full read-modify-write of the stored document and
/// stamps a fresh `lastModified`. There is no coordination between
/// writers: whoever saves last wins.
///
/// ```
/// use threadline_core::guest_cart::{LocalCart, LocalCartItem, MemoryStorage};
/// use threadline_core::{ProductId, VariantId};
///
/// let mut cart = LocalCart::new(MemoryStorage::new());
/// let tee = LocalCartItem::plain(ProductId::new(1), "tee", VariantId::new(2), 1);
/// cart.add_item(tee.clone()).unwrap();
/// cart.add_item(tee.clone()).unwrap();
/// assert_eq!(cart.get_item_quantity(&tee.identity()), 2);
/// ```
#[derive(Debug)]
pub struct LocalCart<S> {
    storage: S,
}

impl<S: CartStorage> LocalCart<S> {
    /// Wrap a storage backend.
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Read the current cart; unreadable content yields an empty cart.
    pub fn get_cart(&self) -> GuestCart {
        GuestCart::from_storage(self.storage.load().as_deref())
    }

    /// Add a line, merging with an equivalent existing line.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the updated cart cannot be saved.
    pub fn add_item(&mut self, item: LocalCartItem) -> Result<GuestCart, StorageError> {
        self.mutate(|cart| cart.add_item(item))
    }

    /// Set a line's quantity; zero or less removes the line.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the updated cart cannot be saved.
    pub fn update_item(
        &mut self,
        identity: &ItemIdentity,
        quantity: i64,
    ) -> Result<GuestCart, StorageError> {
        self.mutate(|cart| {
            cart.update_item(identity, quantity);
        })
    }

    /// Remove every matching line. Removing an absent line is a no-op.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the updated cart cannot be saved.
    pub fn remove_item(&mut self, identity: &ItemIdentity) -> Result<GuestCart, StorageError> {
        self.mutate(|cart| {
            cart.remove_item(identity);
        })
    }

    /// Discard the whole cart.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backend refuses the write.
    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.storage.clear()
    }

    /// Total quantity across all lines.
    pub fn get_item_count(&self) -> u64 {
        self.get_cart().item_count()
    }

    /// Whether a matching line exists.
    pub fn has_item(&self, identity: &ItemIdentity) -> bool {
        self.get_cart().has_item(identity)
    }

    /// Quantity of the matching line, or 0.
    pub fn get_item_quantity(&self, identity: &ItemIdentity) -> u32 {
        self.get_cart().item_quantity(identity)
    }

    /// The raw item list, for a later hand-off to a server-side cart.
    pub fn export_for_sync(&self) -> Vec<LocalCartItem> {
        self.get_cart().items
    }

    /// Give back the storage backend.
    pub fn into_storage(self) -> S {
        self.storage
    }

    fn mutate(&mut self, apply: impl FnOnce(&mut GuestCart)) -> Result<GuestCart, StorageError> {
        let mut cart = self.get_cart();
        apply(&mut cart);
        cart.last_modified = Utc::now();
        self.storage.store(cart.to_json()?)?;
        Ok(cart)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::guest_cart::CustomizationData;
    use crate::types::{CustomizationId, DesignId, ProductId, ThreadColor, VariantId};

    fn item(product: i32, variant: i32, quantity: u32) -> LocalCartItem {
        LocalCartItem::plain(
            ProductId::new(product),
            format!("product-{product}"),
            VariantId::new(variant),
            quantity,
        )
    }

    /// Storage whose writes always fail.
    struct ReadOnlyStorage;

    impl CartStorage for ReadOnlyStorage {
        fn load(&self) -> Option<String> {
            None
        }

        fn store(&mut self, _raw: String) -> Result<(), StorageError> {
            Err(StorageError::Backend("quota exceeded".to_owned()))
        }

        fn clear(&mut self) -> Result<(), StorageError> {
            Err(StorageError::Backend("quota exceeded".to_owned()))
        }
    }

    #[test]
    fn test_add_persists_and_merges() {
        let mut cart = LocalCart::new(MemoryStorage::new());
        cart.add_item(item(1, 1, 2)).unwrap();
        cart.add_item(item(1, 1, 5)).unwrap();

        let stored = cart.into_storage().into_contents().unwrap();
        let reloaded = GuestCart::parse(&stored).unwrap();
        assert_eq!(reloaded.items.len(), 1);
        assert_eq!(reloaded.item_count(), 7);
    }

    #[test]
    fn test_mutation_stamps_last_modified() {
        let mut cart = LocalCart::new(MemoryStorage::new());
        let saved = cart.add_item(item(1, 1, 1)).unwrap();
        assert!(saved.last_modified > chrono::DateTime::<Utc>::default());
    }

    #[test]
    fn test_update_to_zero_then_quantity_is_zero() {
        let mut cart = LocalCart::new(MemoryStorage::new());
        let line = item(2, 3, 4);
        cart.add_item(line.clone()).unwrap();
        cart.update_item(&line.identity(), 0).unwrap();
        assert!(!cart.has_item(&line.identity()));
        assert_eq!(cart.get_item_quantity(&line.identity()), 0);
    }

    #[test]
    fn test_negative_update_removes() {
        let mut cart = LocalCart::new(MemoryStorage::new());
        let line = item(2, 3, 4);
        cart.add_item(line.clone()).unwrap();
        let after = cart.update_item(&line.identity(), -2).unwrap();
        assert!(after.is_empty());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut cart = LocalCart::new(MemoryStorage::new());
        cart.add_item(item(1, 1, 1)).unwrap();
        let absent = item(9, 9, 1).identity();
        let first = cart.remove_item(&absent).unwrap();
        let second = cart.remove_item(&absent).unwrap();
        assert_eq!(first.items, second.items);
        assert_eq!(cart.get_item_count(), 1);
    }

    #[test]
    fn test_corrupted_storage_reads_empty() {
        let storage = MemoryStorage::with_contents(Some("<<garbage>>".to_owned()));
        let cart = LocalCart::new(storage);
        assert!(cart.get_cart().is_empty());
        assert_eq!(cart.get_item_count(), 0);
    }

    #[test]
    fn test_corrupted_storage_is_overwritten_on_add() {
        let storage = MemoryStorage::with_contents(Some("<<garbage>>".to_owned()));
        let mut cart = LocalCart::new(storage);
        cart.add_item(item(1, 1, 1)).unwrap();
        assert_eq!(cart.get_item_count(), 1);
    }

    #[test]
    fn test_write_failure_is_reported() {
        let mut cart = LocalCart::new(ReadOnlyStorage);
        let err = cart.add_item(item(1, 1, 1)).unwrap_err();
        assert!(matches!(err, StorageError::Backend(_)));
    }

    #[test]
    fn test_clear_and_export() {
        let mut cart = LocalCart::new(MemoryStorage::new());
        cart.add_item(item(1, 1, 1)).unwrap();
        cart.add_item(item(1, 2, 1)).unwrap();
        assert_eq!(cart.export_for_sync().len(), 2);
        cart.clear().unwrap();
        assert!(cart.export_for_sync().is_empty());
    }

    /// A generated cart operation.
    #[derive(Debug, Clone)]
    enum Op {
        Add(LocalCartItem),
        Update(ItemIdentity, i64),
        Remove(ItemIdentity),
    }

    fn arb_item() -> impl Strategy<Value = LocalCartItem> {
        let customization = prop_oneof![
            Just((None, None)),
            (1..3i32).prop_map(|id| (Some(CustomizationId::new(id)), None)),
            (1..3i32, prop::sample::select(vec!["#FF0000", "#00FF00"])).prop_map(
                |(design, hex)| {
                    let data = CustomizationData {
                        design_id: DesignId::new(design),
                        thread_color_hex: ThreadColor::parse(hex).unwrap(),
                        preview_image: None,
                        position: None,
                    };
                    (None, Some(data))
                }
            ),
        ];

        (1..3i32, 1..3i32, 0..20u32, customization).prop_map(
            |(product, variant, quantity, (customization_id, customization_data))| {
                let mut line = item(product, variant, quantity);
                line.customization_id = customization_id;
                line.customization_data = customization_data;
                line
            },
        )
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            arb_item().prop_map(Op::Add),
            (arb_item(), -3..20i64).prop_map(|(line, qty)| Op::Update(line.identity(), qty)),
            arb_item().prop_map(|line| Op::Remove(line.identity())),
        ]
    }

    proptest! {
        #[test]
        fn prop_item_count_equals_sum_of_quantities(ops in prop::collection::vec(arb_op(), 0..40)) {
            let mut cart = LocalCart::new(MemoryStorage::new());
            for op in ops {
                match op {
                    Op::Add(line) => { cart.add_item(line).unwrap(); }
                    Op::Update(identity, qty) => { cart.update_item(&identity, qty).unwrap(); }
                    Op::Remove(identity) => { cart.remove_item(&identity).unwrap(); }
                }

                let snapshot = cart.get_cart();
                let sum: u64 = snapshot.items.iter().map(|line| u64::from(line.quantity)).sum();
                prop_assert_eq!(cart.get_item_count(), sum);
                prop_assert!(snapshot.items.iter().all(|line| line.quantity > 0));
            }
        }

        #[test]
        fn prop_plain_adds_accumulate(a in 1..1_000u32, b in 1..1_000u32) {
            let mut cart = LocalCart::new(MemoryStorage::new());
            cart.add_item(item(1, 1, a)).unwrap();
            let after = cart.add_item(item(1, 1, b)).unwrap();
            prop_assert_eq!(after.items.len(), 1);
            prop_assert_eq!(after.item_count(), u64::from(a) + u64::from(b));
        }
    }
}
