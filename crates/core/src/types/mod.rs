//! Core types for Threadline.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod color;
pub mod content_key;
pub mod email;
pub mod id;
pub mod order_number;
pub mod price;
pub mod status;

pub use color::{ThreadColor, ThreadColorError};
pub use content_key::{ContentKey, ContentKeyError};
pub use email::{Email, EmailError};
pub use id::*;
pub use order_number::{format_order_number, is_order_number, new_order_number};
pub use price::Price;
pub use status::*;
