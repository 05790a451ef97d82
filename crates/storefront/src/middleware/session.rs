//! Session middleware configuration and the session-held guest cart.
//!
//! Sessions live in `PostgreSQL` via tower-sessions. The only thing the
//! storefront keeps in them is the guest cart document, stored as the raw
//! JSON string under [`session_keys::GUEST_CART`].

use sqlx::PgPool;
use tower_sessions::{Expiry, Session, SessionManagerLayer, session};
use tower_sessions_sqlx_store::PostgresStore;

use threadline_core::guest_cart::{LocalCart, MemoryStorage};

use crate::config::StorefrontConfig;
use crate::models::session_keys;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "tl_session";

/// Session expiry time in seconds (30 days of inactivity).
const SESSION_EXPIRY_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Create the session layer with `PostgreSQL` store.
///
/// The `tower_sessions.session` table is created by `tl-cli migrate`.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &StorefrontConfig,
) -> SessionManagerLayer<PostgresStore> {
    let store = PostgresStore::new(pool.clone());

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.secure_cookies())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

// =============================================================================
// Guest Cart
// =============================================================================

/// Load the guest cart slot from the session.
///
/// # Errors
///
/// Returns a session error if the session store cannot be read.
pub async fn load_guest_cart(session: &Session) -> Result<LocalCart<MemoryStorage>, session::Error> {
    let raw = session.get::<String>(session_keys::GUEST_CART).await?;
    Ok(LocalCart::new(MemoryStorage::with_contents(raw)))
}

/// Write the guest cart slot back; an emptied slot removes the key.
///
/// # Errors
///
/// Returns a session error if the session store cannot be written.
pub async fn store_guest_cart(
    session: &Session,
    cart: LocalCart<MemoryStorage>,
) -> Result<(), session::Error> {
    match cart.into_storage().into_contents() {
        Some(raw) => session.insert(session_keys::GUEST_CART, raw).await,
        None => discard_guest_cart(session).await,
    }
}

/// Drop the guest cart from the session.
///
/// # Errors
///
/// Returns a session error if the session store cannot be written.
pub async fn discard_guest_cart(session: &Session) -> Result<(), session::Error> {
    session.remove::<String>(session_keys::GUEST_CART).await?;
    Ok(())
}
