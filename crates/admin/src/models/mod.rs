//! Admin domain models.
//!
//! Store models (products, orders, ...) are shared with the storefront and
//! re-exported from there.

pub mod admin_user;
pub mod session;

pub use admin_user::{AdminRole, AdminUser};
pub use petal_storefront::models::*;
pub use session::{CurrentAdmin, keys as session_keys};
