//! Business logic for the admin console.
//!
//! - `auth` - Admin-only password sign-in and token issuance
//! - `orders` - Transition-checked order status changes

pub mod auth;
pub mod orders;
