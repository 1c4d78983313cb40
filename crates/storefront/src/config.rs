//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL of the storefront API
//! - `STOREFRONT_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_CORS_ORIGINS` - Comma-separated origins allowed to call the API
//! - `SHOP_TAX_RATE` - Tax rate as a fraction (default: 0.15)
//! - `SHOP_SHIPPING_FEE` - Flat shipping fee (default: 25.00)
//! - `SHOP_FREE_SHIPPING_THRESHOLD` - Subtotal for free shipping (default: 300.00)
//! - `OTP_PROVIDER` - `sandbox`, `twilio` or `vonage` (default: sandbox)
//! - `OTP_TTL_SECONDS` - OTP lifetime (default: 300)
//! - `OTP_RESEND_COOLDOWN_SECONDS` - Minimum gap between sends (default: 30)
//! - `OTP_DEFAULT_COUNTRY_CODE` - Country code for national numbers (e.g. 966)
//! - `TWILIO_ACCOUNT_SID`, `TWILIO_AUTH_TOKEN`, `TWILIO_FROM_NUMBER`,
//!   `TWILIO_WHATSAPP_FROM` - Required when `OTP_PROVIDER=twilio`
//! - `VONAGE_API_KEY`, `VONAGE_API_SECRET`, `VONAGE_FROM` - Required when `OTP_PROVIDER=vonage`
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use petal_core::PricingConfig;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

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
];

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
    /// Public base URL of the API
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Origins allowed to call the API from a browser
    pub cors_origins: Vec<String>,
    /// Tax and shipping settings
    pub pricing: PricingConfig,
    /// One-time password settings
    pub otp: OtpConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Which vendor delivers one-time passwords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OtpProviderKind {
    /// No delivery; codes are only cached (local development).
    #[default]
    Sandbox,
    Twilio,
    Vonage,
}

impl FromStr for OtpProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sandbox" | "log" => Ok(Self::Sandbox),
            "twilio" => Ok(Self::Twilio),
            "vonage" | "nexmo" => Ok(Self::Vonage),
            other => Err(format!("unknown OTP provider '{other}'")),
        }
    }
}

/// One-time password configuration.
#[derive(Debug, Clone)]
pub struct OtpConfig {
    pub provider: OtpProviderKind,
    /// How long a code stays valid
    pub ttl: Duration,
    /// Minimum time between two sends to the same phone
    pub resend_cooldown: Duration,
    /// Country code applied to national numbers (digits only)
    pub default_country_code: Option<String>,
    pub twilio: Option<TwilioConfig>,
    pub vonage: Option<VonageConfig>,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            provider: OtpProviderKind::Sandbox,
            ttl: Duration::from_secs(300),
            resend_cooldown: Duration::from_secs(30),
            default_country_code: None,
            twilio: None,
            vonage: None,
        }
    }
}

/// Twilio Messages API credentials.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: SecretString,
    /// Sender for SMS
    pub from_number: String,
    /// Sender for WhatsApp (defaults to `from_number`)
    pub whatsapp_from: Option<String>,
}

impl std::fmt::Debug for TwilioConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[REDACTED]")
            .field("from_number", &self.from_number)
            .field("whatsapp_from", &self.whatsapp_from)
            .finish()
    }
}

/// Vonage SMS API credentials.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct VonageConfig {
    pub api_key: String,
    pub api_secret: SecretString,
    pub from: String,
}

impl std::fmt::Debug for VonageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VonageConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("from", &self.from)
            .finish()
    }
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
        let base_url = get_base_url("STOREFRONT_BASE_URL")?;
        let session_secret = get_session_secret("STOREFRONT_SESSION_SECRET")?;

        let cors_origins = get_optional_env("STOREFRONT_CORS_ORIGINS")
            .map(|raw| split_list(&raw))
            .unwrap_or_default();

        let pricing = pricing_from_env()?;
        let otp = OtpConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            cors_origins,
            pricing,
            otp,
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

impl OtpConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let provider = get_env_or_default("OTP_PROVIDER", "sandbox")
            .parse::<OtpProviderKind>()
            .map_err(|e| ConfigError::InvalidEnvVar("OTP_PROVIDER".to_string(), e))?;
        let ttl = Duration::from_secs(parse_env_or_default::<u64>("OTP_TTL_SECONDS", "300")?);
        let resend_cooldown = Duration::from_secs(parse_env_or_default::<u64>(
            "OTP_RESEND_COOLDOWN_SECONDS",
            "30",
        )?);

        let default_country_code = get_optional_env("OTP_DEFAULT_COUNTRY_CODE")
            .map(|cc| cc.trim().trim_start_matches('+').to_string());
        if let Some(cc) = &default_country_code
            && (cc.is_empty() || !cc.chars().all(|c| c.is_ascii_digit()))
        {
            return Err(ConfigError::InvalidEnvVar(
                "OTP_DEFAULT_COUNTRY_CODE".to_string(),
                "must be digits, e.g. 966".to_string(),
            ));
        }

        let twilio = if provider == OtpProviderKind::Twilio {
            Some(TwilioConfig {
                account_sid: get_required_env("TWILIO_ACCOUNT_SID")?,
                auth_token: get_validated_secret("TWILIO_AUTH_TOKEN")?,
                from_number: get_required_env("TWILIO_FROM_NUMBER")?,
                whatsapp_from: get_optional_env("TWILIO_WHATSAPP_FROM"),
            })
        } else {
            None
        };

        let vonage = if provider == OtpProviderKind::Vonage {
            Some(VonageConfig {
                api_key: get_required_env("VONAGE_API_KEY")?,
                api_secret: get_required_secret("VONAGE_API_SECRET")?,
                from: get_env_or_default("VONAGE_FROM", "Petal"),
            })
        } else {
            None
        };

        Ok(Self {
            provider,
            ttl,
            resend_cooldown,
            default_country_code,
            twilio,
            vonage,
        })
    }
}

/// Load tax and shipping settings.
fn pricing_from_env() -> Result<PricingConfig, ConfigError> {
    let tax_rate = parse_env_or_default::<Decimal>("SHOP_TAX_RATE", "0.15")?;
    if tax_rate < Decimal::ZERO || tax_rate >= Decimal::ONE {
        return Err(ConfigError::InvalidEnvVar(
            "SHOP_TAX_RATE".to_string(),
            "must be a fraction between 0 and 1".to_string(),
        ));
    }

    Ok(PricingConfig {
        tax_rate,
        shipping_fee: parse_env_or_default::<Decimal>("SHOP_SHIPPING_FEE", "25.00")?,
        free_shipping_threshold: parse_env_or_default::<Decimal>(
            "SHOP_FREE_SHIPPING_THRESHOLD",
            "300.00",
        )?,
    })
}

// =============================================================================
// Helper Functions
// =============================================================================
//
// Public helpers are shared with the admin service's configuration.

/// Get a required environment variable.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if the variable is unset.
pub fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if neither variable is set.
pub fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable (empty values count as unset).
#[must_use]
pub fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default`.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` if the value does not parse.
pub fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Split a comma-separated list, dropping blanks.
#[must_use]
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
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

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

/// Load a session signing secret: long enough, not a placeholder and not
/// low-entropy.
///
/// # Errors
///
/// Returns `ConfigError` if the secret is missing or fails validation.
pub fn get_session_secret(key: &str) -> Result<SecretString, ConfigError> {
    let secret = get_validated_secret(key)?;
    validate_session_secret(&secret, key)?;
    Ok(secret)
}

/// Load a required public base URL.
///
/// # Errors
///
/// Returns `ConfigError` if the variable is missing or not an absolute URL.
pub fn get_base_url(key: &str) -> Result<String, ConfigError> {
    let base_url = get_required_env(key)?;
    url::Url::parse(&base_url)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    Ok(base_url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_bounds() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy("aB3$xY9!mK2@nL5#") > 3.3);
    }

    #[test]
    fn test_validate_secret_strength() {
        assert!(matches!(
            validate_secret_strength("changeme-session-key", "TEST_VAR"),
            Err(ConfigError::InsecureSecret(_, _))
        ));
        assert!(validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR").is_err());
        assert!(validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_validate_session_secret_length() {
        assert!(validate_session_secret(&SecretString::from("short"), "S").is_err());
        assert!(validate_session_secret(&SecretString::from("a".repeat(32)), "S").is_ok());
    }

    #[test]
    fn test_otp_provider_parsing() {
        assert_eq!(
            "Twilio".parse::<OtpProviderKind>().unwrap(),
            OtpProviderKind::Twilio
        );
        assert_eq!(
            "nexmo".parse::<OtpProviderKind>().unwrap(),
            OtpProviderKind::Vonage
        );
        assert_eq!(
            " sandbox ".parse::<OtpProviderKind>().unwrap(),
            OtpProviderKind::Sandbox
        );
        assert!("pigeon".parse::<OtpProviderKind>().is_err());
    }

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list("https://petal.shop, ,http://localhost:5173"),
            vec!["https://petal.shop", "http://localhost:5173"]
        );
    }

    #[test]
    fn test_twilio_config_debug_redacts_token() {
        let config = TwilioConfig {
            account_sid: "AC123".to_string(),
            auth_token: SecretString::from("very-private-token"),
            from_number: "+15005550006".to_string(),
            whatsapp_from: None,
        };
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("AC123"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("very-private-token"));
    }

    #[test]
    fn test_socket_addr_and_secure_flag() {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/petal"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "https://api.petal.shop".to_string(),
            session_secret: SecretString::from("x".repeat(32)),
            cors_origins: Vec::new(),
            pricing: PricingConfig::default(),
            otp: OtpConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
        };

        assert_eq!(config.socket_addr().port(), 3000);
        assert!(config.is_secure());
    }
}
