//! Password hashing with Argon2id.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Errors from password validation, hashing and verification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordError {
    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    TooShort,
    #[error("password hashing failed")]
    Hash,
    #[error("password does not match")]
    Mismatch,
}

/// Validate password meets requirements.
///
/// # Errors
///
/// Returns [`PasswordError::TooShort`] below [`MIN_PASSWORD_LENGTH`] characters.
pub fn validate_password(password: &str) -> Result<(), PasswordError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::TooShort);
    }
    Ok(())
}

/// Hash a password into a PHC string.
///
/// # Errors
///
/// Returns [`PasswordError::Hash`] if Argon2 fails.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| PasswordError::Hash)
}

/// Verify a password against a stored PHC string.
///
/// # Errors
///
/// Returns [`PasswordError::Mismatch`] for a wrong password or an unreadable hash.
pub fn verify_password(password: &str, hash: &str) -> Result<(), PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::Mismatch)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| PasswordError::Mismatch)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert_eq!(
            verify_password("battery staple", &hash),
            Err(PasswordError::Mismatch)
        );
    }

    #[test]
    fn test_verify_garbage_hash() {
        assert_eq!(
            verify_password("whatever1", "not-a-phc-string"),
            Err(PasswordError::Mismatch)
        );
    }

    #[test]
    fn test_minimum_length() {
        assert_eq!(validate_password("short"), Err(PasswordError::TooShort));
        assert!(validate_password("12345678").is_ok());
    }
}
