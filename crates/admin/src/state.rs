//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use threadline_core::access::RoutePolicy;
use threadline_core::auth::TokenCodec;

use crate::config::AdminConfig;
use crate::middleware::AccessControl;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    access: AccessControl,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: AdminConfig, pool: PgPool) -> Self {
        let access = AccessControl::new(
            RoutePolicy::admin_console(),
            TokenCodec::new(config.auth.key()),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                access,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Route policy and token codec used by the access middleware.
    #[must_use]
    pub fn access(&self) -> &AccessControl {
        &self.inner.access
    }

    #[must_use]
    pub fn codec(&self) -> &TokenCodec {
        self.inner.access.codec()
    }
}
