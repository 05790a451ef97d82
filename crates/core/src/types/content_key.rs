//! Keys of admin-managed content blocks.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Maximum key length.
pub const MAX_CONTENT_KEY_LENGTH: usize = 64;

/// Error returned for a key outside `[a-z0-9-]{1,64}`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("content key must be 1-{MAX_CONTENT_KEY_LENGTH} characters of a-z, 0-9 or '-', got {0:?}")]
pub struct ContentKeyError(pub String);

/// A slug-like content block key, e.g. `home-hero`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentKey(String);

impl ContentKey {
    /// Validate a key.
    ///
    /// # Errors
    ///
    /// Returns [`ContentKeyError`] for empty, overlong or non-slug keys.
    pub fn parse(s: &str) -> Result<Self, ContentKeyError> {
        let valid = !s.is_empty()
            && s.len() <= MAX_CONTENT_KEY_LENGTH
            && s.bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');

        if valid {
            Ok(Self(s.to_owned()))
        } else {
            Err(ContentKeyError(s.to_owned()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ContentKey {
    type Error = ContentKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ContentKey> for String {
    fn from(key: ContentKey) -> Self {
        key.0
    }
}
