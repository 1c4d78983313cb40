//! Session-related types.
//!
//! Types stored in the session for authentication and cart state.

use serde::{Deserialize, Serialize};

use petal_core::{CustomerId, Phone};

/// Session-stored customer identity.
///
/// Minimal data stored in the session to identify the logged-in customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentCustomer {
    /// Customer's database ID.
    pub id: CustomerId,
    /// Normalized phone number.
    pub phone: Phone,
    /// Display name.
    pub name: String,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in customer.
    pub const CURRENT_CUSTOMER: &str = "current_customer";

    /// Key for the guest cart token.
    pub const CART_TOKEN: &str = "cart_token";

    /// Key for a phone number proven by OTP but not yet logged in.
    pub const VERIFIED_PHONE: &str = "verified_phone";
}
