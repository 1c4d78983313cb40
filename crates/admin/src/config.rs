//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `ADMIN_BASE_URL` - Public URL of the admin service
//! - `ADMIN_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `ADMIN_CORS_ORIGINS` - Comma-separated origins of the admin SPA
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//!
//! Parsing and secret validation are shared with the storefront.

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;

pub use petal_storefront::config::ConfigError;
use petal_storefront::config::{
    get_base_url, get_database_url, get_optional_env, get_session_secret, parse_env_or_default,
    split_list,
};

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    /// Public base URL; `https://` turns on secure cookies.
    pub base_url: String,
    pub session_secret: SecretString,
    /// Origins of the admin SPA. Empty means same-origin only.
    pub cors_origins: Vec<String>,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
}

impl AdminConfig {
    /// Load configuration from environment variables, reading `.env` first
    /// when present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the session secret fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            database_url: get_database_url("ADMIN_DATABASE_URL")?,
            host: parse_env_or_default("ADMIN_HOST", "127.0.0.1")?,
            port: parse_env_or_default("ADMIN_PORT", "3001")?,
            base_url: get_base_url("ADMIN_BASE_URL")?,
            session_secret: get_session_secret("ADMIN_SESSION_SECRET")?,
            cors_origins: get_optional_env("ADMIN_CORS_ORIGINS")
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> AdminConfig {
        AdminConfig {
            database_url: SecretString::from("postgres://localhost/petal"),
            host: "0.0.0.0".parse().unwrap(),
            port: 3001,
            base_url: base_url.to_string(),
            session_secret: SecretString::from("k".repeat(32)),
            cors_origins: vec!["https://admin.petal.shop".to_string()],
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    #[test]
    fn test_secure_cookies_follow_base_url() {
        assert!(config("https://admin.petal.shop").is_secure());
        assert!(!config("http://localhost:3001").is_secure());
    }

    #[test]
    fn test_socket_addr() {
        let addr = config("http://localhost:3001").socket_addr();
        assert_eq!(addr.to_string(), "0.0.0.0:3001");
    }
}
