//! Authentication error types.

use thiserror::Error;

use crate::services::otp::OtpError;
use crate::db::RepositoryError;

/// Errors that can occur during phone authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] petal_core::EmailError),

    /// OTP verification or delivery failed.
    #[error(transparent)]
    Otp(#[from] OtpError),

    /// A customer already exists for this phone.
    #[error("an account already exists for this phone number")]
    AlreadyRegistered,

    /// No customer exists for this phone.
    #[error("no account exists for this phone number")]
    NotRegistered,

    /// The customer has been deactivated.
    #[error("this account has been disabled")]
    AccountDisabled,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
