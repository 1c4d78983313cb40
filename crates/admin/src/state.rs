//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use petal_storefront::services::{OrderService, PaymentService};

use crate::config::AdminConfig;
use crate::services::AdminAuthService;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. The admin service talks to the database
/// directly; order and payment changes go through the storefront services so
/// both sides apply the same lifecycle rules.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: AdminConfig, pool: PgPool) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, pool }),
        }
    }

    /// Get a reference to the admin configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn auth(&self) -> AdminAuthService<'_> {
        AdminAuthService::new(self.pool())
    }

    #[must_use]
    pub fn orders(&self) -> OrderService<'_> {
        OrderService::new(self.pool())
    }

    #[must_use]
    pub fn payments(&self) -> PaymentService<'_> {
        PaymentService::new(self.pool())
    }
}
