//! Phone verification audit record.

use chrono::{DateTime, Utc};
use serde::Serialize;

use petal_core::{OtpChannel, VerificationRequestId, VerificationStatus};

/// One OTP send. The code itself is never stored.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationRequest {
    pub id: VerificationRequestId,
    pub phone: String,
    pub channel: OtpChannel,
    pub status: VerificationStatus,
    pub attempts: i32,
    pub expires_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
