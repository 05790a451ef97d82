//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront (`https` enables Secure cookies)
//! - `AUTH_TOKEN_SECRET` - Token signing secret shared with the admin console (min 32 chars, high entropy)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `ACCESS_TOKEN_TTL_MINUTES` - Access token lifetime (default: 15)
//! - `REFRESH_TOKEN_TTL_DAYS` - Refresh token lifetime (default: 30)
//! - `SHIPPING_FLAT_RATE` - Shipping charged below the threshold (default: 5.00)
//! - `FREE_SHIPPING_THRESHOLD` - Subtotal that ships free (default: 75.00)
//! - `CATALOG_CACHE_TTL_SECONDS` - Catalog cache lifetime (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use threadline_core::Price;
use threadline_core::pricing::ShippingPolicy;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Token signing configuration
    pub auth: AuthConfig,
    /// Shipping quote parameters
    pub shipping: ShippingPolicy,
    /// Catalog cache lifetime in seconds
    pub catalog_cache_ttl_seconds: u64,
    /// Sentry error tracking
    pub sentry: SentryConfig,
}

/// Token signing configuration, shared in shape with the admin console.
#[derive(Clone)]
pub struct AuthConfig {
    /// HS256 signing secret
    pub token_secret: SecretString,
    /// Access token lifetime in minutes
    pub access_ttl_minutes: i64,
    /// Refresh token lifetime in days
    pub refresh_ttl_days: i64,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_secret", &"[REDACTED]")
            .field("access_ttl_minutes", &self.access_ttl_minutes)
            .field("refresh_ttl_days", &self.refresh_ttl_days)
            .finish()
    }
}

/// Sentry configuration.
#[derive(Debug, Clone, Default)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    pub environment: Option<String>,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = parse_env_or_default::<IpAddr>("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env_or_default::<u16>("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_owned(), e.to_string())
        })?;

        let shipping = ShippingPolicy {
            flat_rate: Price::new(parse_env_or_default::<Decimal>("SHIPPING_FLAT_RATE", "5.00")?),
            free_threshold: Price::new(parse_env_or_default::<Decimal>(
                "FREE_SHIPPING_THRESHOLD",
                "75.00",
            )?),
        };
        if shipping.flat_rate.is_negative() || shipping.free_threshold.is_negative() {
            return Err(ConfigError::InvalidEnvVar(
                "SHIPPING_FLAT_RATE".to_owned(),
                "shipping amounts must not be negative".to_owned(),
            ));
        }

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            auth: AuthConfig::from_env()?,
            shipping,
            catalog_cache_ttl_seconds: parse_env_or_default("CATALOG_CACHE_TTL_SECONDS", "300")?,
            sentry: SentryConfig::from_env()?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies must carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl AuthConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let token_secret = get_validated_secret("AUTH_TOKEN_SECRET")?;
        let access_ttl_minutes = parse_env_or_default("ACCESS_TOKEN_TTL_MINUTES", "15")?;
        let refresh_ttl_days = parse_env_or_default("REFRESH_TOKEN_TTL_DAYS", "30")?;

        if access_ttl_minutes <= 0 || refresh_ttl_days <= 0 {
            return Err(ConfigError::InvalidEnvVar(
                "ACCESS_TOKEN_TTL_MINUTES".to_owned(),
                "token lifetimes must be positive".to_owned(),
            ));
        }

        Ok(Self {
            token_secret,
            access_ttl_minutes,
            refresh_ttl_days,
        })
    }

    /// Raw signing key bytes.
    #[must_use]
    pub fn key(&self) -> &[u8] {
        self.token_secret.expose_secret().as_bytes()
    }
}

impl SentryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            dsn: get_optional_env("SENTRY_DSN"),
            environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sample_rate: parse_env_or_default("SENTRY_SAMPLE_RATE", "1.0")?,
            traces_sample_rate: parse_env_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, using `default` when unset.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Load and validate a signing secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    threadline_core::secret::validate_signing_secret(&value)
        .map_err(|e| ConfigError::InsecureSecret(key.to_string(), e.to_string()))?;
    Ok(SecretString::from(value))
}

/// Configuration fixture for unit tests.
#[cfg(test)]
pub(crate) fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://localhost/test"),
        host: IpAddr::from([127, 0, 0, 1]),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        auth: AuthConfig {
            token_secret: SecretString::from("kP9$wq2!Lz7@Rm4#Xt8&Bv1*Nc6^Hs3%"),
            access_ttl_minutes: 15,
            refresh_ttl_days: 30,
        },
        shipping: ShippingPolicy {
            flat_rate: Price::from_cents(500),
            free_threshold: Price::from_cents(7_500),
        },
        catalog_cache_ttl_seconds: 300,
        sentry: SentryConfig::default(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> StorefrontConfig {
        test_config()
    }

    #[test]
    fn test_socket_addr() {
        let addr = config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_secure_cookies_follow_scheme() {
        let mut config = config();
        assert!(!config.secure_cookies());
        config.base_url = "https://shop.threadline.test".to_owned();
        assert!(config.secure_cookies());
    }

    #[test]
    fn test_debug_redacts_token_secret() {
        let debug_output = format!("{:?}", config());
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("kP9$wq2"));
        assert!(!debug_output.contains("postgres://localhost/test"));
    }

    #[test]
    fn test_parse_env_or_default_uses_default() {
        let value: u16 = parse_env_or_default("THREADLINE_TEST_UNSET_PORT", "4242").unwrap();
        assert_eq!(value, 4242);
    }

    #[test]
    fn test_parse_env_or_default_rejects_garbage_default() {
        let err = parse_env_or_default::<u16>("THREADLINE_TEST_UNSET_PORT", "port").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }
}
