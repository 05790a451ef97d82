//! Compact HS256 JSON Web Tokens.
//!
//! The applications issue and read their own tokens, so only the subset
//! they need is supported: a fixed `{"alg":"HS256","typ":"JWT"}` header and
//! the claims `sub`, `email`, `role`, `kind`, `iat`, `exp`.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::types::{Role, UserId};

type HmacSha256 = Hmac<Sha256>;

const HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// Errors from issuing or reading a token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Not three base64url segments, or the header is not ours.
    #[error("malformed token")]
    Malformed,
    /// Signature does not match the payload.
    #[error("bad token signature")]
    BadSignature,
    /// Payload is not a valid claims document.
    #[error("invalid token claims: {0}")]
    InvalidClaims(String),
    /// The `role` claim is not a known role.
    #[error("unknown role: {0}")]
    UnknownRole(String),
    /// An access token was presented where a refresh token was expected or vice versa.
    #[error("expected {expected} token, got {actual}")]
    WrongKind { expected: TokenKind, actual: TokenKind },
    /// Signature is valid but `exp` has passed.
    #[error("token expired")]
    Expired,
    /// The signing key was rejected by HMAC.
    #[error("invalid signing key")]
    Key,
}

/// What a token may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Short-lived; authorizes requests.
    Access,
    /// Long-lived; only exchanges for a new access token.
    Refresh,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        })
    }
}

/// Verified token contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
    pub kind: TokenKind,
    pub issued_at: i64,
    pub expires_at: i64,
}

impl Claims {
    /// Claims for a token issued at `now` that lives for `ttl`.
    #[must_use]
    pub fn new(
        user_id: UserId,
        email: impl Into<String>,
        role: Role,
        kind: TokenKind,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            user_id,
            email: email.into(),
            role,
            kind,
            issued_at: now.timestamp(),
            expires_at: (now + ttl).timestamp(),
        }
    }

    /// Whether the token has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now.timestamp()
    }
}

/// Claims as they appear on the wire.
#[derive(Debug, Serialize, Deserialize)]
struct WireClaims {
    sub: String,
    email: String,
    role: String,
    kind: TokenKind,
    iat: i64,
    exp: i64,
}

/// Signs and verifies tokens with a shared secret.
#[derive(Clone)]
pub struct TokenCodec {
    key: Vec<u8>,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl TokenCodec {
    /// Create a codec from the raw signing secret.
    #[must_use]
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: secret.to_vec(),
        }
    }

    /// Encode and sign `claims`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidClaims`] if the claims cannot be
    /// serialized, or [`TokenError::Key`] if HMAC rejects the key.
    pub fn issue(&self, claims: &Claims) -> Result<String, TokenError> {
        let wire = WireClaims {
            sub: claims.user_id.to_string(),
            email: claims.email.clone(),
            role: claims.role.to_string(),
            kind: claims.kind,
            iat: claims.issued_at,
            exp: claims.expires_at,
        };
        let payload =
            serde_json::to_vec(&wire).map_err(|e| TokenError::InvalidClaims(e.to_string()))?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(HEADER),
            URL_SAFE_NO_PAD.encode(payload)
        );
        let signature = self.sign(signing_input.as_bytes())?;

        Ok(format!(
            "{signing_input}.{}",
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    /// Verify `token` and check that it is an unexpired token of `expected` kind.
    ///
    /// Checks run in order: structure, signature, claims, kind, expiry.
    ///
    /// # Errors
    ///
    /// Returns the first [`TokenError`] that applies.
    pub fn verify(
        &self,
        token: &str,
        expected: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<Claims, TokenError> {
        let mut parts = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Malformed);
        };

        let header_bytes = URL_SAFE_NO_PAD
            .decode(header)
            .map_err(|_| TokenError::Malformed)?;
        if header_bytes != HEADER.as_bytes() {
            return Err(TokenError::Malformed);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Malformed)?;
        let signing_input_len = header.len() + 1 + payload.len();
        let signing_input = token
            .get(..signing_input_len)
            .ok_or(TokenError::Malformed)?;

        let mut mac = HmacSha256::new_from_slice(&self.key).map_err(|_| TokenError::Key)?;
        mac.update(signing_input.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let payload_bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Malformed)?;
        let wire: WireClaims = serde_json::from_slice(&payload_bytes)
            .map_err(|e| TokenError::InvalidClaims(e.to_string()))?;

        let claims = Claims {
            user_id: wire
                .sub
                .parse()
                .map_err(|_| TokenError::InvalidClaims(format!("bad subject: {}", wire.sub)))?,
            role: wire
                .role
                .parse()
                .map_err(|_| TokenError::UnknownRole(wire.role.clone()))?,
            email: wire.email,
            kind: wire.kind,
            issued_at: wire.iat,
            expires_at: wire.exp,
        };

        if claims.kind != expected {
            return Err(TokenError::WrongKind {
                expected,
                actual: claims.kind,
            });
        }

        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn sign(&self, input: &[u8]) -> Result<Vec<u8>, TokenError> {
        let mut mac = HmacSha256::new_from_slice(&self.key).map_err(|_| TokenError::Key)?;
        mac.update(input);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"kP9$wq2!Lz7@Rm4#Xt8&Bv1*Nc6^Hs3%";

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_800_000_000, 0).unwrap()
    }

    fn access_claims(role: Role) -> Claims {
        Claims::new(
            UserId::new(42),
            "ada@example.com",
            role,
            TokenKind::Access,
            now(),
            Duration::minutes(15),
        )
    }

    #[test]
    fn test_round_trip() {
        let codec = TokenCodec::new(SECRET);
        let claims = access_claims(Role::Admin);
        let token = codec.issue(&claims).unwrap();

        assert_eq!(token.split('.').count(), 3);
        let decoded = codec.verify(&token, TokenKind::Access, now()).unwrap();
        assert_eq!(decoded, claims);
    }

    #[test]
    fn test_tampered_payload_fails_signature() {
        let codec = TokenCodec::new(SECRET);
        let token = codec.issue(&access_claims(Role::Customer)).unwrap();

        let forged_claims = access_claims(Role::Admin);
        let forged = codec.issue(&forged_claims).unwrap();
        let forged_payload = forged.split('.').nth(1).unwrap();

        let mut parts: Vec<&str> = token.split('.').collect();
        parts[1] = forged_payload;
        let tampered = parts.join(".");

        assert_eq!(
            codec.verify(&tampered, TokenKind::Access, now()),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_other_key_fails_signature() {
        let token = TokenCodec::new(SECRET)
            .issue(&access_claims(Role::Customer))
            .unwrap();
        let other = TokenCodec::new(b"a-completely-different-signing-key!!");
        assert_eq!(
            other.verify(&token, TokenKind::Access, now()),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_expiry_boundary() {
        let codec = TokenCodec::new(SECRET);
        let claims = access_claims(Role::Customer);
        let token = codec.issue(&claims).unwrap();

        let just_before = now() + Duration::minutes(15) - Duration::seconds(1);
        let at_expiry = now() + Duration::minutes(15);
        assert!(codec.verify(&token, TokenKind::Access, just_before).is_ok());
        assert_eq!(
            codec.verify(&token, TokenKind::Access, at_expiry),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_kind_mismatch() {
        let codec = TokenCodec::new(SECRET);
        let token = codec.issue(&access_claims(Role::Customer)).unwrap();
        assert_eq!(
            codec.verify(&token, TokenKind::Refresh, now()),
            Err(TokenError::WrongKind {
                expected: TokenKind::Refresh,
                actual: TokenKind::Access,
            })
        );
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let codec = TokenCodec::new(SECRET);
        let payload = serde_json::json!({
            "sub": "42", "email": "ada@example.com", "role": "superuser",
            "kind": "access", "iat": 0, "exp": i64::MAX,
        });
        let input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(HEADER),
            URL_SAFE_NO_PAD.encode(payload.to_string())
        );
        let signature = codec.sign(input.as_bytes()).unwrap();
        let token = format!("{input}.{}", URL_SAFE_NO_PAD.encode(signature));

        assert_eq!(
            codec.verify(&token, TokenKind::Access, now()),
            Err(TokenError::UnknownRole("superuser".to_owned()))
        );
    }

    #[test]
    fn test_malformed_inputs() {
        let codec = TokenCodec::new(SECRET);
        for bad in ["", "abc", "a.b", "a.b.c.d", "!!.??.**"] {
            assert_eq!(
                codec.verify(bad, TokenKind::Access, now()),
                Err(TokenError::Malformed),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_debug_redacts_key() {
        let debug = format!("{:?}", TokenCodec::new(SECRET));
        assert!(!debug.contains("kP9"));
        assert!(debug.contains("[REDACTED]"));
    }
}
