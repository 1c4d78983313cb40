//! Database operations for the Petal `PostgreSQL` database.
//!
//! # Tables
//!
//! - Catalog: `categories`, `colors`, `sizes`, `occasions`, `products`,
//!   `product_attributes`, `product_occasions`
//! - Customers: `customers`, `addresses`, `verification_requests`
//! - Commerce: `carts`, `cart_items`, `orders`, `order_items`, `payments`,
//!   `discounts`, `discount_usages`
//! - `events`, `landscape_bookings`
//! - `tower_sessions.session` - Tower-sessions storage
//!
//! The admin service reads and writes the same tables through these
//! repositories plus its own CRUD queries.
//!
//! # Migrations
//!
//! Migrations are stored in the workspace `migrations/` directory and run via:
//! ```bash
//! cargo run -p petal-cli -- migrate
//! ```

pub mod bookings;
pub mod carts;
pub mod catalog;
pub mod customers;
pub mod discounts;
pub mod events;
pub mod orders;
pub mod payments;
pub mod verifications;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use bookings::BookingRepository;
pub use carts::CartRepository;
pub use catalog::CatalogRepository;
pub use customers::{AddressRepository, CustomerRepository};
pub use discounts::DiscountRepository;
pub use events::EventRepository;
pub use orders::OrderRepository;
pub use payments::PaymentRepository;
pub use verifications::VerificationRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique phone).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map unique and foreign-key violations to `Conflict`, everything else
    /// to `Database`.
    #[must_use]
    pub fn from_write(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return Self::Conflict(format!("{what} already exists"));
            }
            if db_err.is_foreign_key_violation() {
                return Self::Conflict(format!("{what} references a missing or in-use record"));
            }
        }
        Self::Database(err)
    }
}

/// Pagination window for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number.
    pub page: i64,
    pub per_page: i64,
}

impl Page {
    pub const DEFAULT_PER_PAGE: i64 = 12;
    pub const MAX_PER_PAGE: i64 = 100;

    /// Build a page from optional query parameters, clamping to sane bounds.
    #[must_use]
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page
                .unwrap_or(Self::DEFAULT_PER_PAGE)
                .clamp(1, Self::MAX_PER_PAGE),
        }
    }

    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }

    #[must_use]
    pub const fn limit(&self) -> i64 {
        self.per_page
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results plus the total row count.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub last_page: i64,
}

impl<T> Paginated<T> {
    #[must_use]
    pub fn new(data: Vec<T>, page: Page, total: i64) -> Self {
        let last_page = if total == 0 {
            1
        } else {
            (total + page.per_page - 1) / page.per_page
        };
        Self {
            data,
            page: page.page,
            per_page: page.per_page,
            total,
            last_page,
        }
    }

    /// Transform every item, keeping the pagination metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            last_page: self.last_page,
        }
    }
}

/// Escape `%`, `_` and `\` for use inside an `ILIKE` pattern.
#[must_use]
pub fn like_pattern(search: &str) -> String {
    let escaped = search
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_clamps() {
        let page = Page::new(Some(0), Some(1000));
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, Page::MAX_PER_PAGE);
        assert_eq!(page.offset(), 0);

        let page = Page::new(Some(3), Some(10));
        assert_eq!(page.offset(), 20);
        assert_eq!(page.limit(), 10);
    }

    #[test]
    fn test_paginated_last_page() {
        let page = Page::new(Some(1), Some(10));
        assert_eq!(Paginated::<i32>::new(Vec::new(), page, 0).last_page, 1);
        assert_eq!(Paginated::<i32>::new(Vec::new(), page, 10).last_page, 1);
        assert_eq!(Paginated::<i32>::new(Vec::new(), page, 11).last_page, 2);
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(" rose "), "%rose%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
