//! Domain models for the storefront.
//!
//! Structs that map one-to-one onto query results derive `sqlx::FromRow`;
//! views assembled from several queries live next to them.

pub mod address;
pub mod cart;
pub mod catalog;
pub mod order;
pub mod session;
pub mod studio;
pub mod user;

pub use address::{Address, AddressInput, AddressSnapshot};
pub use cart::{CartLine, CartSummary, CartView};
pub use catalog::{Design, Product, ProductDetail, ProductPage, Variant, VariantView};
pub use order::{CustomizationSnapshot, Order, OrderDetail, OrderItem};
pub use session::session_keys;
pub use studio::Customization;
pub use user::User;
