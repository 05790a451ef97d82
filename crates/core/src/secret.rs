//! Strength checks for configured secrets.
//!
//! Both binaries sign tokens with `AUTH_TOKEN_SECRET`, so the checks live
//! here and each config layer maps [`WeakSecret`] into its own error type.

use std::collections::HashMap;

/// Minimum accepted secret length in bytes.
pub const MIN_SECRET_LENGTH: usize = 32;

/// Minimum accepted Shannon entropy in bits per character.
pub const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Why a secret was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WeakSecret {
    #[error("must be at least {min} characters (got {actual})")]
    TooShort { min: usize, actual: usize },
    #[error("appears to be a placeholder (contains '{0}')")]
    Placeholder(&'static str),
    #[error("entropy too low ({entropy:.2} bits/char, need >= {min:.1}). Use a randomly generated secret.")]
    LowEntropy { entropy: f64, min: f64 },
}

/// Calculate Shannon entropy in bits per character.
#[must_use]
pub fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Reject placeholders and low-entropy values.
///
/// # Errors
///
/// Returns [`WeakSecret::Placeholder`] or [`WeakSecret::LowEntropy`].
pub fn check_strength(secret: &str) -> Result<(), WeakSecret> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS
        .iter()
        .copied()
        .find(|pattern: &&str| lower.contains(*pattern))
    {
        return Err(WeakSecret::Placeholder(pattern));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(WeakSecret::LowEntropy {
            entropy,
            min: MIN_ENTROPY_BITS_PER_CHAR,
        });
    }

    Ok(())
}

/// Full validation for a signing key: length, then strength.
///
/// # Errors
///
/// Returns the first [`WeakSecret`] reason that applies.
pub fn validate_signing_secret(secret: &str) -> Result<(), WeakSecret> {
    if secret.len() < MIN_SECRET_LENGTH {
        return Err(WeakSecret::TooShort {
            min: MIN_SECRET_LENGTH,
            actual: secret.len(),
        });
    }
    check_strength(secret)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_placeholder_rejected() {
        assert_eq!(
            check_strength("your-signing-key-here"),
            Err(WeakSecret::Placeholder("your-"))
        );
        assert!(check_strength("changeme123").is_err());
    }

    #[test]
    fn test_low_entropy_rejected() {
        let err = check_strength(&"a".repeat(40)).unwrap_err();
        assert!(matches!(err, WeakSecret::LowEntropy { .. }));
    }

    #[test]
    fn test_short_rejected_before_strength() {
        let err = validate_signing_secret("aB3$xY9!").unwrap_err();
        assert_eq!(err, WeakSecret::TooShort { min: 32, actual: 8 });
    }

    #[test]
    fn test_random_secret_accepted() {
        assert!(validate_signing_secret("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%").is_ok());
    }
}
