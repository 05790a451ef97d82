//! Domain models for the admin console.

pub mod catalog;
pub mod order;
pub mod user;

pub use catalog::{Design, DesignInput, Product, ProductInput, Variant, VariantInput, VariantUpdate};
pub use order::{Order, OrderDetail, OrderItem, OrderPage};
pub use user::{AdminUser, UserSummary};
