//! Twilio Messages API client.

use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::{debug, error, instrument};

use petal_core::{OtpChannel, Phone};

use super::SmsError;
use crate::config::TwilioConfig;

/// Twilio REST API base URL.
const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";

/// Successful message creation.
#[derive(Debug, Deserialize)]
struct MessageResponse {
    sid: String,
    status: Option<String>,
}

/// Error body returned with 4xx/5xx responses.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    code: Option<i64>,
    message: String,
}

/// Twilio client for SMS and WhatsApp messages.
///
/// `Debug` comes from the config type, which redacts the auth token.
#[derive(Debug, Clone)]
pub struct TwilioClient {
    client: Client,
    config: TwilioConfig,
}

impl TwilioClient {
    #[must_use]
    pub fn new(config: TwilioConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Sender and recipient addresses for a channel.
    fn addresses(&self, to: &Phone, channel: OtpChannel) -> (String, String) {
        match channel {
            OtpChannel::Sms => (self.config.from_number.clone(), to.to_string()),
            OtpChannel::Whatsapp => {
                let from = self
                    .config
                    .whatsapp_from
                    .as_deref()
                    .unwrap_or(&self.config.from_number);
                (whatsapp_address(from), whatsapp_address(to.as_str()))
            }
        }
    }

    /// Send a message.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails or Twilio rejects the message.
    #[instrument(skip(self, body), fields(to = %to, channel = %channel))]
    pub async fn send(&self, to: &Phone, channel: OtpChannel, body: &str) -> Result<(), SmsError> {
        let (from, to_address) = self.addresses(to, channel);
        let url = format!(
            "{TWILIO_API_BASE}/Accounts/{}/Messages.json",
            self.config.account_sid
        );

        let response = self
            .client
            .post(url)
            .basic_auth(
                &self.config.account_sid,
                Some(self.config.auth_token.expose_secret()),
            )
            .form(&[("To", to_address.as_str()), ("From", from.as_str()), ("Body", body)])
            .send()
            .await
            .map_err(|e| SmsError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let err: ErrorResponse = response
                .json()
                .await
                .map_err(|e| SmsError::Response(e.to_string()))?;
            error!(
                status = %status,
                code = ?err.code,
                message = %err.message,
                "Twilio API error sending message"
            );
            return Err(SmsError::Provider(err.message));
        }

        let result: MessageResponse = response
            .json()
            .await
            .map_err(|e| SmsError::Response(e.to_string()))?;

        debug!(sid = %result.sid, status = ?result.status, "Message queued with Twilio");
        Ok(())
    }
}

/// Prefix an address with `whatsapp:` unless it already has it.
fn whatsapp_address(number: &str) -> String {
    if number.starts_with("whatsapp:") {
        number.to_string()
    } else {
        format!("whatsapp:{number}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn client(whatsapp_from: Option<&str>) -> TwilioClient {
        TwilioClient::new(TwilioConfig {
            account_sid: "AC0000".to_string(),
            auth_token: SecretString::from("token"),
            from_number: "+15005550006".to_string(),
            whatsapp_from: whatsapp_from.map(String::from),
        })
    }

    #[test]
    fn test_sms_addresses() {
        let to = Phone::parse("+966501234567").unwrap();
        let (from, to) = client(None).addresses(&to, OtpChannel::Sms);
        assert_eq!(from, "+15005550006");
        assert_eq!(to, "+966501234567");
    }

    #[test]
    fn test_whatsapp_addresses_are_prefixed() {
        let to = Phone::parse("+966501234567").unwrap();
        let (from, to) = client(Some("whatsapp:+14155238886")).addresses(&to, OtpChannel::Whatsapp);
        assert_eq!(from, "whatsapp:+14155238886");
        assert_eq!(to, "whatsapp:+966501234567");

        let (from, _) = client(None).addresses(
            &Phone::parse("+966501234567").unwrap(),
            OtpChannel::Whatsapp,
        );
        assert_eq!(from, "whatsapp:+15005550006");
    }

    #[test]
    fn test_parse_error_body() {
        let body = r#"{"code": 21211, "message": "The 'To' number is not valid.", "status": 400}"#;
        let err: ErrorResponse = serde_json::from_str(body).unwrap();
        assert_eq!(err.code, Some(21211));
        assert!(err.message.contains("not valid"));
    }
}
