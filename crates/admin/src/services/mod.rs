//! Business logic services for admin.
//!
//! Order and payment changes reuse the storefront services (see
//! [`crate::state::AppState`]); only admin authentication lives here.
//!
//! # Services
//!
//! - `auth` - Email and password login for admin users

pub mod auth;

pub use auth::{AdminAuthError, AdminAuthService};
