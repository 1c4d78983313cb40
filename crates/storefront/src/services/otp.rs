//! One-time password issuance and verification.
//!
//! Codes live only in an in-process [`moka`] cache keyed `otp_<digits>`; the
//! database keeps an audit row per send in `verification_requests`.

use std::time::{Duration, Instant};

use chrono::Utc;
use moka::future::Cache;
use moka::ops::compute::Op;
use rand::Rng;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, instrument, warn};

use petal_core::{OtpChannel, Phone, PhoneError, VerificationStatus};

use crate::db::{RepositoryError, VerificationRepository};
use crate::sms::{OtpSender, SmsError, otp_message};

/// Failed verifications before a code is discarded.
pub const MAX_ATTEMPTS: u8 = 5;

/// Upper bound on cached codes.
const MAX_CACHED_CODES: u64 = 100_000;

/// Errors from the OTP flow.
#[derive(Debug, Error)]
pub enum OtpError {
    #[error("invalid phone number: {0}")]
    InvalidPhone(#[from] PhoneError),

    /// A code was sent to this phone too recently.
    #[error("please wait {retry_after_secs} seconds before requesting a new code")]
    TooSoon { retry_after_secs: u64 },

    /// Wrong, expired, missing or exhausted code.
    #[error("the verification code is invalid or has expired")]
    InvalidCode,

    #[error("could not deliver verification code: {0}")]
    Delivery(#[from] SmsError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Clone)]
struct OtpEntry {
    code: String,
    attempts: u8,
    issued_at: Instant,
    expires_at: Instant,
}

/// Result of checking a submitted code against the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Check {
    Matched,
    Mismatch { exhausted: bool },
    Missing,
}

/// Shared store of outstanding codes.
#[derive(Clone)]
pub struct OtpStore {
    cache: Cache<String, OtpEntry>,
    ttl: Duration,
    resend_cooldown: Duration,
}

impl std::fmt::Debug for OtpStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtpStore")
            .field("ttl", &self.ttl)
            .field("resend_cooldown", &self.resend_cooldown)
            .field("entries", &self.cache.entry_count())
            .finish_non_exhaustive()
    }
}

impl OtpStore {
    #[must_use]
    pub fn new(ttl: Duration, resend_cooldown: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(MAX_CACHED_CODES)
            .time_to_live(ttl)
            .build();

        Self {
            cache,
            ttl,
            resend_cooldown,
        }
    }

    /// How long an issued code stays valid.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    fn key(phone: &Phone) -> String {
        format!("otp_{}", phone.digits())
    }

    /// Generate and cache a fresh code, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `OtpError::TooSoon` inside the resend cooldown.
    pub async fn issue(&self, phone: &Phone) -> Result<String, OtpError> {
        let code = generate_code();
        let now = Instant::now();
        let cooldown = self.resend_cooldown;
        let mut refused: Option<Duration> = None;

        let fresh = OtpEntry {
            code: code.clone(),
            attempts: 0,
            issued_at: now,
            expires_at: now + self.ttl,
        };

        self.cache
            .entry(Self::key(phone))
            .and_compute_with(|existing| {
                let op = match existing.map(|e| e.into_value()) {
                    Some(previous) if now.duration_since(previous.issued_at) < cooldown => {
                        refused = Some(cooldown - now.duration_since(previous.issued_at));
                        Op::Nop
                    }
                    _ => Op::Put(fresh),
                };
                std::future::ready(op)
            })
            .await;

        if let Some(wait) = refused {
            return Err(OtpError::TooSoon {
                retry_after_secs: wait.as_secs().max(1),
            });
        }
        Ok(code)
    }

    /// Check a submitted code. A match consumes the code; a mismatch counts
    /// an attempt and discards the code after [`MAX_ATTEMPTS`].
    async fn check(&self, phone: &Phone, submitted: &str) -> Check {
        let now = Instant::now();
        let mut outcome = Check::Missing;

        self.cache
            .entry(Self::key(phone))
            .and_compute_with(|existing| {
                let op = match existing.map(|e| e.into_value()) {
                    None => Op::Nop,
                    Some(entry) if now >= entry.expires_at => Op::Remove,
                    Some(entry) if constant_time_compare(&entry.code, submitted) => {
                        outcome = Check::Matched;
                        Op::Remove
                    }
                    Some(mut entry) => {
                        entry.attempts += 1;
                        let exhausted = entry.attempts >= MAX_ATTEMPTS;
                        outcome = Check::Mismatch { exhausted };
                        if exhausted { Op::Remove } else { Op::Put(entry) }
                    }
                };
                std::future::ready(op)
            })
            .await;

        outcome
    }

    /// Verify a submitted code.
    ///
    /// # Errors
    ///
    /// Returns `OtpError::InvalidCode` on any failure.
    pub async fn verify(&self, phone: &Phone, submitted: &str) -> Result<(), OtpError> {
        match self.check(phone, submitted).await {
            Check::Matched => Ok(()),
            _ => Err(OtpError::InvalidCode),
        }
    }

    /// Drop any outstanding code for a phone.
    pub async fn invalidate(&self, phone: &Phone) {
        self.cache.invalidate(&Self::key(phone)).await;
    }
}

/// A six digit, zero padded code.
fn generate_code() -> String {
    let n: u32 = rand::rng().random_range(0..1_000_000);
    format!("{n:06}")
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

/// Outcome of a successful send.
#[derive(Debug, Clone)]
pub struct SentOtp {
    pub phone: Phone,
    pub channel: OtpChannel,
    pub expires_in: Duration,
}

/// OTP flow over the cache, the delivery transport and the audit table.
pub struct OtpService<'a> {
    verifications: VerificationRepository<'a>,
    store: &'a OtpStore,
    sender: &'a OtpSender,
    default_country_code: Option<&'a str>,
}

impl<'a> OtpService<'a> {
    #[must_use]
    pub const fn new(
        pool: &'a PgPool,
        store: &'a OtpStore,
        sender: &'a OtpSender,
        default_country_code: Option<&'a str>,
    ) -> Self {
        Self {
            verifications: VerificationRepository::new(pool),
            store,
            sender,
            default_country_code,
        }
    }

    /// Normalize a user-entered phone number.
    ///
    /// # Errors
    ///
    /// Returns `OtpError::InvalidPhone` if the number cannot be normalized.
    pub fn normalize_phone(&self, input: &str) -> Result<Phone, OtpError> {
        Ok(Phone::parse_with_country(input, self.default_country_code)?)
    }

    /// Issue a code and deliver it.
    ///
    /// # Errors
    ///
    /// Returns `OtpError::TooSoon` inside the resend cooldown and
    /// `OtpError::Delivery` when the transport fails.
    #[instrument(skip(self), fields(provider = self.sender.name()))]
    pub async fn send(&self, phone_input: &str, channel: OtpChannel) -> Result<SentOtp, OtpError> {
        let phone = self.normalize_phone(phone_input)?;
        let code = self.store.issue(&phone).await?;

        let ttl = self.store.ttl();
        let expires_at = Utc::now()
            + chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::minutes(5));
        let message = otp_message(&code, ttl.as_secs().div_ceil(60));

        if let Err(e) = self.sender.send(&phone, channel, &message).await {
            warn!(phone = %phone, error = %e, "OTP delivery failed");
            self.store.invalidate(&phone).await;
            self.verifications
                .create(&phone, channel, VerificationStatus::Failed, expires_at)
                .await?;
            return Err(e.into());
        }

        self.verifications
            .create(&phone, channel, VerificationStatus::Pending, expires_at)
            .await?;

        info!(phone = %phone, "OTP sent");
        Ok(SentOtp {
            phone,
            channel,
            expires_in: ttl,
        })
    }

    /// Verify and consume a code.
    ///
    /// # Errors
    ///
    /// Returns `OtpError::InvalidCode` if the code does not match.
    #[instrument(skip(self, code))]
    pub async fn verify(&self, phone_input: &str, code: &str) -> Result<Phone, OtpError> {
        let phone = self.normalize_phone(phone_input)?;

        match self.store.check(&phone, code.trim()).await {
            Check::Matched => {
                self.verifications.mark_approved(&phone).await?;
                info!(phone = %phone, "OTP verified");
                Ok(phone)
            }
            Check::Mismatch { exhausted } => {
                self.verifications
                    .record_failed_attempt(&phone, exhausted)
                    .await?;
                warn!(phone = %phone, exhausted, "OTP mismatch");
                Err(OtpError::InvalidCode)
            }
            Check::Missing => Err(OtpError::InvalidCode),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn phone() -> Phone {
        Phone::parse("+966501234567").unwrap()
    }

    fn store() -> OtpStore {
        OtpStore::new(Duration::from_secs(300), Duration::from_secs(30))
    }

    #[test]
    fn test_generate_code_is_six_digits() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("123456", "123456"));
        assert!(!constant_time_compare("123456", "123457"));
        assert!(!constant_time_compare("123456", "12345"));
    }

    #[test]
    fn test_key_uses_digits() {
        assert_eq!(OtpStore::key(&phone()), "otp_966501234567");
    }

    #[tokio::test]
    async fn test_code_is_single_use() {
        let store = store();
        let code = store.issue(&phone()).await.unwrap();

        assert!(store.verify(&phone(), &code).await.is_ok());
        assert!(matches!(
            store.verify(&phone(), &code).await,
            Err(OtpError::InvalidCode)
        ));
    }

    #[tokio::test]
    async fn test_resend_within_cooldown_is_refused() {
        let store = store();
        store.issue(&phone()).await.unwrap();

        let err = store.issue(&phone()).await.unwrap_err();
        match err {
            OtpError::TooSoon { retry_after_secs } => assert!(retry_after_secs <= 30),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resend_after_cooldown_replaces_code() {
        let store = OtpStore::new(Duration::from_secs(300), Duration::ZERO);
        let first = store.issue(&phone()).await.unwrap();
        let second = store.issue(&phone()).await.unwrap();

        if first != second {
            assert!(store.verify(&phone(), &first).await.is_err());
            // the failed attempt does not consume the new code
            assert!(store.verify(&phone(), &second).await.is_ok());
        }
    }

    #[tokio::test]
    async fn test_code_is_discarded_after_max_attempts() {
        let store = store();
        let code = store.issue(&phone()).await.unwrap();
        let wrong = if code == "000000" { "111111" } else { "000000" };

        for attempt in 1..=MAX_ATTEMPTS {
            let outcome = store.check(&phone(), wrong).await;
            assert_eq!(
                outcome,
                Check::Mismatch {
                    exhausted: attempt == MAX_ATTEMPTS
                }
            );
        }
        assert_eq!(store.check(&phone(), &code).await, Check::Missing);
    }

    #[tokio::test]
    async fn test_expired_code_is_rejected() {
        let store = OtpStore::new(Duration::from_millis(20), Duration::ZERO);
        let code = store.issue(&phone()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(store.verify(&phone(), &code).await.is_err());
    }

    #[tokio::test]
    async fn test_invalidate_allows_immediate_resend() {
        let store = store();
        store.issue(&phone()).await.unwrap();
        store.invalidate(&phone()).await;
        assert!(store.issue(&phone()).await.is_ok());
    }
}
