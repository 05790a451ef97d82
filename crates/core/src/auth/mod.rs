//! Authentication primitives shared by the storefront and the admin console.
//!
//! - [`token`] - HS256-signed access and refresh tokens
//! - [`password`] - Argon2id password hashing

pub mod password;
pub mod token;

pub use password::{MIN_PASSWORD_LENGTH, PasswordError, hash_password, validate_password, verify_password};
pub use token::{Claims, TokenCodec, TokenError, TokenKind};
