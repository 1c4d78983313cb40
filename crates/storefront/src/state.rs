//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::services::{AuthService, CartService, CheckoutService, OtpService, OtpStore};
use crate::sms::{OtpSender, SmsError};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections, the OTP cache and
/// configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    otp_store: OtpStore,
    otp_sender: OtpSender,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured OTP provider has no credentials.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, SmsError> {
        let otp_sender = OtpSender::from_config(&config.otp)?;
        let otp_store = OtpStore::new(config.otp.ttl, config.otp.resend_cooldown);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                otp_store,
                otp_sender,
            }),
        })
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

    /// Get a reference to the OTP code cache.
    #[must_use]
    pub fn otp_store(&self) -> &OtpStore {
        &self.inner.otp_store
    }

    /// Get a reference to the OTP delivery transport.
    #[must_use]
    pub fn otp_sender(&self) -> &OtpSender {
        &self.inner.otp_sender
    }

    #[must_use]
    pub fn otp(&self) -> OtpService<'_> {
        OtpService::new(
            self.pool(),
            self.otp_store(),
            self.otp_sender(),
            self.config().otp.default_country_code.as_deref(),
        )
    }

    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self.pool(), self.otp())
    }

    #[must_use]
    pub fn carts(&self) -> CartService<'_> {
        CartService::new(self.pool(), self.config().pricing)
    }

    #[must_use]
    pub fn checkout(&self) -> CheckoutService<'_> {
        CheckoutService::new(self.pool(), self.config().pricing)
    }
}
