//! One-time password delivery over SMS and WhatsApp.
//!
//! The transport is chosen at startup from `OTP_PROVIDER`:
//!
//! - `sandbox` - no delivery; the code is only cached and logged at debug level
//! - `twilio` - Twilio Messages API (SMS and WhatsApp)
//! - `vonage` - Vonage SMS API (SMS only)

pub mod twilio;
pub mod vonage;

use thiserror::Error;
use tracing::{debug, instrument, warn};

use petal_core::{OtpChannel, Phone};

pub use twilio::TwilioClient;
pub use vonage::VonageClient;

use crate::config::{OtpConfig, OtpProviderKind};

/// Errors that can occur when delivering a message.
#[derive(Debug, Error)]
pub enum SmsError {
    /// HTTP request failed.
    #[error("SMS request failed: {0}")]
    Request(String),

    /// Failed to parse response.
    #[error("SMS response error: {0}")]
    Response(String),

    /// Provider rejected the message.
    #[error("SMS provider error: {0}")]
    Provider(String),

    /// Provider is selected but not configured.
    #[error("SMS configuration error: {0}")]
    Config(String),
}

/// The configured OTP transport.
#[derive(Debug, Clone)]
pub enum OtpSender {
    Sandbox,
    Twilio(TwilioClient),
    Vonage(VonageClient),
}

impl OtpSender {
    /// Build the transport selected in configuration.
    ///
    /// # Errors
    ///
    /// Returns `SmsError::Config` if the selected provider has no credentials.
    pub fn from_config(config: &OtpConfig) -> Result<Self, SmsError> {
        match config.provider {
            OtpProviderKind::Sandbox => Ok(Self::Sandbox),
            OtpProviderKind::Twilio => config
                .twilio
                .clone()
                .map(|c| Self::Twilio(TwilioClient::new(c)))
                .ok_or_else(|| SmsError::Config("Twilio credentials missing".to_string())),
            OtpProviderKind::Vonage => config
                .vonage
                .clone()
                .map(|c| Self::Vonage(VonageClient::new(c)))
                .ok_or_else(|| SmsError::Config("Vonage credentials missing".to_string())),
        }
    }

    /// Provider name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sandbox => "sandbox",
            Self::Twilio(_) => "twilio",
            Self::Vonage(_) => "vonage",
        }
    }

    /// Whether messages are actually delivered.
    #[must_use]
    pub const fn is_sandbox(&self) -> bool {
        matches!(self, Self::Sandbox)
    }

    /// Deliver `body` to `to` over `channel`.
    ///
    /// # Errors
    ///
    /// Returns `SmsError` if the provider request fails or is rejected.
    #[instrument(skip(self, body), fields(provider = self.name(), channel = %channel))]
    pub async fn send(&self, to: &Phone, channel: OtpChannel, body: &str) -> Result<(), SmsError> {
        match self {
            Self::Sandbox => {
                debug!(to = %to, body, "Sandbox OTP delivery skipped");
                Ok(())
            }
            Self::Twilio(client) => client.send(to, channel, body).await,
            Self::Vonage(client) => {
                if channel == OtpChannel::Whatsapp {
                    warn!("Vonage transport has no WhatsApp support, sending SMS instead");
                }
                client.send_sms(to, body).await
            }
        }
    }
}

/// The text of an OTP message.
#[must_use]
pub fn otp_message(code: &str, ttl_minutes: u64) -> String {
    format!("Your Petal verification code is {code}. It expires in {ttl_minutes} minutes.")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_requires_credentials() {
        let config = OtpConfig {
            provider: OtpProviderKind::Twilio,
            ..OtpConfig::default()
        };
        assert!(matches!(
            OtpSender::from_config(&config),
            Err(SmsError::Config(_))
        ));

        let sandbox = OtpSender::from_config(&OtpConfig::default()).unwrap();
        assert!(sandbox.is_sandbox());
        assert_eq!(sandbox.name(), "sandbox");
    }

    #[tokio::test]
    async fn test_sandbox_send_succeeds() {
        let phone = Phone::parse("+966501234567").unwrap();
        let result = OtpSender::Sandbox
            .send(&phone, OtpChannel::Sms, &otp_message("123456", 5))
            .await;
        assert!(result.is_ok());
    }

    #[test]
    fn test_otp_message() {
        assert_eq!(
            otp_message("042137", 5),
            "Your Petal verification code is 042137. It expires in 5 minutes."
        );
    }
}
