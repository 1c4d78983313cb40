//! Petal Core - Shared domain types and business rules.
//!
//! This crate provides the types and rules used by every Petal component:
//! - `storefront` - Public JSON API consumed by the storefront SPA
//! - `admin` - Administration service (direct database CRUD)
//! - `cli` - Command-line tools for migrations, seeding and admin users
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Pricing, totals and discount rules live here so the
//! services that persist their results stay thin and the rules stay testable.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, phones, emails, locales and statuses
//! - [`pricing`] - Current price, line totals and cart/order totals
//! - [`discount`] - Discount code validation and amount computation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod discount;
pub mod pricing;
pub mod types;

pub use discount::{DiscountError, DiscountRule};
pub use pricing::{PricingConfig, Totals};
pub use types::*;
