//! Database operations for admin.
//!
//! The admin service works on the storefront's database directly. Shared
//! repositories (customers, orders, payments, bookings, verification
//! requests) are re-exported from `petal-storefront`; this module adds the
//! admin-only tables and the catalog, discount and event writes.
//!
//! # Tables
//!
//! - `admin_users` - Admin accounts with Argon2 password hashes
//! - `tower_sessions.admin_session` - Admin session storage

pub mod admin_users;
pub mod catalog;
pub mod dashboard;
pub mod discounts;
pub mod events;

pub use petal_storefront::db::{
    AddressRepository, BookingRepository, CatalogRepository, CustomerRepository,
    DiscountRepository, EventRepository, OrderRepository, Page, Paginated, PaymentRepository,
    RepositoryError, VerificationRepository, create_pool, like_pattern,
};

pub use admin_users::AdminUserRepository;
pub use catalog::CatalogAdminRepository;
pub use discounts::DiscountAdminRepository;
pub use events::EventAdminRepository;
