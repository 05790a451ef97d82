//! Keys for values stored in the tower-sessions session.

/// Session keys.
pub mod session_keys {
    /// The serialized guest cart document.
    pub const GUEST_CART: &str = "guest_cart";
}
