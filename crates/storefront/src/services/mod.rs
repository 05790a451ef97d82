//! Business logic for the storefront.
//!
//! # Services
//!
//! - `auth` - Registration, login, password changes and token issuance
//! - `catalog` - Cached product listing and detail
//! - `cart` - Server and guest cart mutations with validation and pricing
//! - `checkout` - Checkout summary and order placement
//! - `orders` - Customer order cancellation
//! - `studio` - Saving garment customizations

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod orders;
pub mod studio;
