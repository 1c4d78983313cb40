//! Customer authentication.
//!
//! Customers prove ownership of a phone number with a one-time password and
//! are then registered or logged in. A successful verification is remembered
//! in the session so a following `register` or `login` call does not need a
//! second code.

mod error;

pub use error::AuthError;

use sqlx::PgPool;
use tracing::info;

use petal_core::{Email, Phone};

use crate::services::otp::{OtpError, OtpService};
use crate::db::{CustomerRepository, RepositoryError};
use crate::models::Customer;

/// Authentication service.
pub struct AuthService<'a> {
    customers: CustomerRepository<'a>,
    otp: OtpService<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, otp: OtpService<'a>) -> Self {
        Self {
            customers: CustomerRepository::new(pool),
            otp,
        }
    }

    /// Establish that the caller owns `phone_input`.
    ///
    /// A phone already verified earlier in this session is accepted as is;
    /// otherwise `code` is verified (and consumed).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Otp` if the phone is invalid or the code does not
    /// match.
    pub async fn confirm_phone(
        &self,
        phone_input: &str,
        code: Option<&str>,
        session_verified: Option<&Phone>,
    ) -> Result<Phone, AuthError> {
        let phone = self.otp.normalize_phone(phone_input)?;

        if session_verified == Some(&phone) {
            return Ok(phone);
        }

        match code {
            Some(code) => Ok(self.otp.verify(phone.as_str(), code).await?),
            None => Err(OtpError::InvalidCode.into()),
        }
    }

    /// Create a customer for a verified phone.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AlreadyRegistered` if the phone is taken and
    /// `AuthError::InvalidEmail` for a malformed email.
    pub async fn register(
        &self,
        phone: &Phone,
        name: &str,
        email: Option<&str>,
    ) -> Result<Customer, AuthError> {
        let email = email
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(Email::parse)
            .transpose()?;

        if self.customers.get_by_phone(phone).await?.is_some() {
            return Err(AuthError::AlreadyRegistered);
        }

        let customer = self
            .customers
            .create(phone, name.trim(), email.as_ref())
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::AlreadyRegistered,
                other => AuthError::Repository(other),
            })?;

        info!(customer_id = %customer.id, "Customer registered");
        Ok(customer)
    }

    /// Load the customer for a verified phone.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotRegistered` if no customer exists and
    /// `AuthError::AccountDisabled` if the customer is inactive.
    pub async fn login(&self, phone: &Phone) -> Result<Customer, AuthError> {
        let customer = self
            .customers
            .get_by_phone(phone)
            .await?
            .ok_or(AuthError::NotRegistered)?;

        if !customer.is_active {
            return Err(AuthError::AccountDisabled);
        }

        self.customers.mark_phone_verified(customer.id).await?;

        info!(customer_id = %customer.id, "Customer logged in");
        Ok(customer)
    }
}
