//! Business logic services for the storefront.
//!
//! Services sit between route handlers and repositories. They own the
//! transactions for multi-row changes and return typed errors that the HTTP
//! layer maps to status codes.
//!
//! # Services
//!
//! - `otp` - One-time password issuance and verification
//! - `auth` - Phone registration and login
//! - `cart` - Cart mutations and totals recalculation
//! - `checkout` - Order placement with stock and discount redemption
//! - `payments` - Payment records, status changes and refunds
//! - `orders` - Order status transitions

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod orders;
pub mod otp;
pub mod payments;

pub use auth::{AuthError, AuthService};
pub use cart::{CartError, CartOwner, CartService};
pub use checkout::{CheckoutError, CheckoutRequest, CheckoutService, ShippingAddress, ShippingTarget};
pub use orders::{OrderError, OrderService};
pub use otp::{OtpError, OtpService, OtpStore};
pub use payments::{PaymentError, PaymentInput, PaymentService};
