//! HTTP route handlers for the admin JSON API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                              - Liveness check
//! GET    /health/ready                        - Readiness check (database)
//!
//! # Auth (auth rate limit on login)
//! POST   /auth/login                          - Log in
//! POST   /auth/logout                         - Log out
//! GET    /auth/me                             - Current admin
//!
//! GET    /dashboard                           - Store counts and recent orders
//!
//! # Catalog
//! GET|POST        /categories                 - List, create
//! GET|PUT|DELETE  /categories/{id}            - Show, update, delete
//! GET|POST        /colors|sizes|occasions     - List, create
//! PUT|DELETE      /colors|sizes|occasions/{id}
//! GET|POST        /products                   - List (search, category_id, is_active), create
//! GET|PUT|DELETE  /products/{id}
//! GET|POST        /products/{id}/attributes   - Variants
//! PUT|DELETE      /products/{id}/attributes/{attr_id}
//! PUT             /products/{id}/occasions    - Replace occasion tags
//!
//! # Promotions and events
//! GET|POST        /discounts, /events
//! GET|PUT|DELETE  /discounts/{id}, /events/{id}
//!
//! # Customers and orders
//! GET             /customers                  - List (search)
//! GET|PUT|DELETE  /customers/{id}
//! GET             /orders                     - List (status)
//! GET|DELETE      /orders/{id}
//! PUT             /orders/{id}/status
//! GET|POST        /orders/{id}/payments
//! PUT             /payments/{id}/status
//! POST            /payments/{id}/refund
//!
//! # Landscaping and OTP audit
//! GET             /landscape-bookings         - List (status)
//! GET|PUT|DELETE  /landscape-bookings/{id}
//! GET             /verification-requests      - List (phone)
//!
//! # Admin users (super admin)
//! GET|POST        /admin-users
//! DELETE          /admin-users/{id}
//! ```
//!
//! Reads need any admin session; mutations need a role that may write.

pub mod admin_users;
pub mod auth;
pub mod bookings;
pub mod catalog;
pub mod customers;
pub mod dashboard;
pub mod discounts;
pub mod events;
pub mod orders;
pub mod products;
pub mod verifications;

use std::str::FromStr;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, post, put},
};
use serde::Deserialize;

use petal_core::ParseEnumError;

use crate::db::Page;
use crate::error::{AppError, Result};
use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Query parameters shared by the list endpoints.
///
/// Each endpoint reads only the filters it supports.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub phone: Option<String>,
    pub category_id: Option<i32>,
    pub is_active: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ListQuery {
    #[must_use]
    pub fn page(&self) -> Page {
        Page::new(self.page, self.per_page)
    }

    /// The trimmed search term, if any.
    #[must_use]
    pub fn search(&self) -> Option<&str> {
        non_blank(self.search.as_deref())
    }

    /// Parse the `status` filter into the endpoint's status enum.
    ///
    /// # Errors
    ///
    /// Returns a 422 on the `status` field for unknown values.
    pub fn status<T>(&self) -> Result<Option<T>>
    where
        T: FromStr<Err = ParseEnumError>,
    {
        non_blank(self.status.as_deref())
            .map(str::parse)
            .transpose()
            .map_err(|e: ParseEnumError| AppError::field("status", e.to_string()))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Turn a cross-field rule violation into a 422.
///
/// # Errors
///
/// Returns `AppError::Validation` when `violation` is set.
pub fn ensure_valid(violation: Option<(&'static str, &'static str)>) -> Result<()> {
    match violation {
        Some((field, message)) => Err(AppError::field(field, message)),
        None => Ok(()),
    }
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    let login = Router::new()
        .route("/login", post(auth::login))
        .layer(auth_rate_limiter());

    Router::new()
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .merge(login)
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/categories",
            get(catalog::categories).post(catalog::create_category),
        )
        .route(
            "/categories/{id}",
            get(catalog::category)
                .put(catalog::update_category)
                .delete(catalog::delete_category),
        )
        .route("/colors", get(catalog::colors).post(catalog::create_color))
        .route(
            "/colors/{id}",
            put(catalog::update_color).delete(catalog::delete_color),
        )
        .route("/sizes", get(catalog::sizes).post(catalog::create_size))
        .route(
            "/sizes/{id}",
            put(catalog::update_size).delete(catalog::delete_size),
        )
        .route(
            "/occasions",
            get(catalog::occasions).post(catalog::create_occasion),
        )
        .route(
            "/occasions/{id}",
            put(catalog::update_occasion).delete(catalog::delete_occasion),
        )
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::destroy),
        )
        .route(
            "/{id}/attributes",
            get(products::attributes).post(products::create_attribute),
        )
        .route(
            "/{id}/attributes/{attr_id}",
            put(products::update_attribute).delete(products::delete_attribute),
        )
        .route("/{id}/occasions", put(products::set_occasions))
}

/// Create the discount and event routes router.
pub fn promotion_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/discounts",
            get(discounts::index).post(discounts::create),
        )
        .route(
            "/discounts/{id}",
            get(discounts::show)
                .put(discounts::update)
                .delete(discounts::destroy),
        )
        .route("/events", get(events::index).post(events::create))
        .route(
            "/events/{id}",
            get(events::show).put(events::update).delete(events::destroy),
        )
}

/// Create the customer, order and payment routes router.
pub fn sales_routes() -> Router<AppState> {
    Router::new()
        .route("/customers", get(customers::index))
        .route(
            "/customers/{id}",
            get(customers::show)
                .put(customers::update)
                .delete(customers::destroy),
        )
        .route("/orders", get(orders::index))
        .route("/orders/{id}", get(orders::show).delete(orders::destroy))
        .route("/orders/{id}/status", put(orders::update_status))
        .route(
            "/orders/{id}/payments",
            get(orders::payments).post(orders::record_payment),
        )
        .route("/payments/{id}/status", put(orders::update_payment_status))
        .route("/payments/{id}/refund", post(orders::refund_payment))
}

/// Create the landscaping and verification audit routes router.
pub fn service_routes() -> Router<AppState> {
    Router::new()
        .route("/landscape-bookings", get(bookings::index))
        .route(
            "/landscape-bookings/{id}",
            get(bookings::show)
                .put(bookings::update)
                .delete(bookings::destroy),
        )
        .route("/verification-requests", get(verifications::index))
}

/// Create the admin user management router.
pub fn admin_user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin_users::index).post(admin_users::create))
        .route("/{id}", delete(admin_users::destroy))
}

/// Create all routes for admin.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/auth", auth_routes())
        .route("/dashboard", get(dashboard::show))
        .merge(catalog_routes())
        .nest("/products", product_routes())
        .merge(promotion_routes())
        .merge(sales_routes())
        .merge(service_routes())
        .nest("/admin-users", admin_user_routes())
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use petal_core::{BookingStatus, OrderStatus};

    use super::*;

    #[test]
    fn test_list_query_status() {
        let query = ListQuery {
            status: Some(" shipped ".to_string()),
            ..ListQuery::default()
        };
        assert_eq!(
            query.status::<OrderStatus>().unwrap(),
            Some(OrderStatus::Shipped)
        );

        let blank = ListQuery {
            status: Some("  ".to_string()),
            ..ListQuery::default()
        };
        assert_eq!(blank.status::<BookingStatus>().unwrap(), None);
    }

    #[test]
    fn test_list_query_rejects_unknown_status() {
        let query = ListQuery {
            status: Some("archived".to_string()),
            ..ListQuery::default()
        };
        let err = query.status::<OrderStatus>().unwrap_err();
        match err {
            AppError::Validation(errors) => {
                assert_eq!(errors["status"], vec!["invalid order status: archived"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_list_query_search_is_trimmed() {
        let query = ListQuery {
            search: Some("  rose ".to_string()),
            ..ListQuery::default()
        };
        assert_eq!(query.search(), Some("rose"));
        assert_eq!(ListQuery::default().search(), None);
    }

    #[test]
    fn test_ensure_valid() {
        assert!(ensure_valid(None).is_ok());
        assert!(matches!(
            ensure_valid(Some(("price", "Too low."))),
            Err(AppError::Validation(_))
        ));
    }
}
