//! Threadline Core - Shared types library.
//!
//! This crate provides common types used across all Threadline components:
//! - `storefront` - Public-facing shop, account area and customization studio
//! - `admin` - Administration console
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains types, pure decision logic and crypto helpers -
//! no database access, no HTTP clients. This keeps it lightweight and
//! allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, colors and statuses
//! - [`guest_cart`] - Guest cart store with the three-way item identity rule
//! - [`access`] - Static route classification and redirect decisions
//! - [`auth`] - Signed session tokens and password hashing
//! - [`pricing`] - Unit prices, cart totals and the shipping quote
//! - [`action`] - The `{ success, message, data }` response envelope
//! - [`secret`] - Strength checks for configured secrets

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod access;
pub mod action;
pub mod auth;
pub mod guest_cart;
pub mod pricing;
pub mod secret;
pub mod types;

pub use action::ActionResult;
pub use types::*;
