//! Vonage (Nexmo) SMS API client.

use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::{debug, error, instrument};

use petal_core::Phone;

use super::SmsError;
use crate::config::VonageConfig;

/// Vonage SMS endpoint.
const VONAGE_SMS_URL: &str = "https://rest.nexmo.com/sms/json";

#[derive(Debug, Deserialize)]
struct SmsResponse {
    messages: Vec<SmsMessageStatus>,
}

#[derive(Debug, Deserialize)]
struct SmsMessageStatus {
    /// `"0"` means accepted.
    status: String,
    #[serde(rename = "message-id")]
    message_id: Option<String>,
    #[serde(rename = "error-text")]
    error_text: Option<String>,
}

impl SmsResponse {
    /// Succeeds when the first message was accepted.
    fn into_result(self) -> Result<Option<String>, SmsError> {
        let first = self
            .messages
            .into_iter()
            .next()
            .ok_or_else(|| SmsError::Response("empty messages array".to_string()))?;

        if first.status == "0" {
            Ok(first.message_id)
        } else {
            Err(SmsError::Provider(first.error_text.unwrap_or_else(|| {
                format!("status {}", first.status)
            })))
        }
    }
}

/// Vonage SMS client.
#[derive(Debug, Clone)]
pub struct VonageClient {
    client: Client,
    config: VonageConfig,
}

impl VonageClient {
    #[must_use]
    pub fn new(config: VonageConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Send an SMS.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails or Vonage rejects the message.
    #[instrument(skip(self, text), fields(to = %to))]
    pub async fn send_sms(&self, to: &Phone, text: &str) -> Result<(), SmsError> {
        let response = self
            .client
            .post(VONAGE_SMS_URL)
            .form(&[
                ("api_key", self.config.api_key.as_str()),
                ("api_secret", self.config.api_secret.expose_secret()),
                ("from", self.config.from.as_str()),
                ("to", to.digits()),
                ("text", text),
            ])
            .send()
            .await
            .map_err(|e| SmsError::Request(e.to_string()))?;

        let result: SmsResponse = response
            .json()
            .await
            .map_err(|e| SmsError::Response(e.to_string()))?;

        match result.into_result() {
            Ok(message_id) => {
                debug!(message_id = ?message_id, "SMS accepted by Vonage");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Vonage API error sending SMS");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_response() {
        let body = r#"{"message-count":"1","messages":[{"to":"966501234567","message-id":"0A0000000123ABCD1","status":"0","remaining-balance":"3.14","message-price":"0.03330000","network":"42001"}]}"#;
        let response: SmsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            response.into_result().unwrap().as_deref(),
            Some("0A0000000123ABCD1")
        );
    }

    #[test]
    fn test_rejected_response() {
        let body = r#"{"message-count":"1","messages":[{"status":"4","error-text":"Bad Credentials"}]}"#;
        let response: SmsResponse = serde_json::from_str(body).unwrap();
        let err = response.into_result().unwrap_err();
        assert_eq!(err.to_string(), "SMS provider error: Bad Credentials");
    }

    #[test]
    fn test_empty_response() {
        let response: SmsResponse = serde_json::from_str(r#"{"messages":[]}"#).unwrap();
        assert!(matches!(response.into_result(), Err(SmsError::Response(_))));
    }
}
