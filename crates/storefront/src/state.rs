//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use threadline_core::access::RoutePolicy;
use threadline_core::auth::TokenCodec;

use crate::config::StorefrontConfig;
use crate::middleware::AccessControl;
use crate::services::catalog::Catalog;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    catalog: Catalog,
    access: AccessControl,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let catalog = Catalog::new(config.catalog_cache_ttl_seconds);
        let access = AccessControl::new(
            RoutePolicy::storefront(),
            TokenCodec::new(config.auth.key()),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                catalog,
                access,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the cached catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Route policy and token codec used by the access middleware.
    #[must_use]
    pub fn access(&self) -> &AccessControl {
        &self.inner.access
    }

    /// Get a reference to the token codec.
    #[must_use]
    pub fn codec(&self) -> &TokenCodec {
        self.inner.access.codec()
    }
}
