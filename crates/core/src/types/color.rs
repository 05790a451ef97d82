//! Embroidery thread color.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ThreadColor`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ThreadColorError {
    /// Not of the form `#RRGGBB`.
    #[error("thread color must look like #RRGGBB, got {0:?}")]
    Format(String),
}

/// A thread color as a `#RRGGBB` hex string, normalized to uppercase.
///
/// Normalizing on construction means two customizations picked as
/// `#ff0000` and `#FF0000` compare equal in the guest cart.
///
/// ```
/// use threadline_core::ThreadColor;
///
/// let red = ThreadColor::parse("#ff0000").unwrap();
/// assert_eq!(red.as_str(), "#FF0000");
/// assert!(ThreadColor::parse("red").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ThreadColor(String);

impl ThreadColor {
    /// Parse and normalize a `#RRGGBB` color.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadColorError::Format`] for anything else.
    pub fn parse(s: &str) -> Result<Self, ThreadColorError> {
        let trimmed = s.trim();
        let valid = trimmed.len() == 7
            && trimmed.starts_with('#')
            && trimmed.chars().skip(1).all(|c| c.is_ascii_hexdigit());

        if !valid {
            return Err(ThreadColorError::Format(s.to_owned()));
        }

        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// The normalized `#RRGGBB` string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThreadColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ThreadColor {
    type Error = ThreadColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ThreadColor> for String {
    fn from(color: ThreadColor) -> Self {
        color.0
    }
}

/// The thread palette offered in the studio.
pub const THREAD_PALETTE: &[(&str, &str)] = &[
    ("Snow", "#FFFFFF"),
    ("Jet", "#111111"),
    ("Scarlet", "#C8102E"),
    ("Navy", "#1F2A44"),
    ("Forest", "#2E5E3E"),
    ("Marigold", "#F2A900"),
    ("Blush", "#F4B6C2"),
    ("Sky", "#7BAFD4"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes() {
        assert_eq!(
            ThreadColor::parse(" #1f2a44 ").map(|c| c.to_string()),
            Ok("#1F2A44".to_owned())
        );
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        for bad in ["", "#FFF", "FFFFFF", "#GGGGGG", "#FFFFFFF"] {
            assert!(ThreadColor::parse(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_palette_entries_are_valid() {
        for (name, hex) in THREAD_PALETTE {
            let parsed = ThreadColor::parse(hex);
            assert_eq!(parsed.map(String::from).as_deref(), Ok(*hex), "{name}");
        }
    }
}
