//! HTTP route handlers for the storefront JSON API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                        - Liveness check
//! GET    /health/ready                  - Readiness check (database)
//!
//! # Auth (OTP rate limit on send-otp, auth rate limit on the rest)
//! POST   /api/send-otp                  - Send a verification code
//! POST   /api/verify-otp                - Verify a code
//! POST   /api/register                  - Create an account
//! POST   /api/login                     - Log in
//! POST   /api/logout                    - Log out
//!
//! # Catalog
//! GET    /api/categories                - Category list
//! GET    /api/categories/{slug}         - Category with products
//! GET    /api/colors|sizes|occasions    - Attribute lookups
//! GET    /api/products                  - Filtered product listing
//! GET    /api/products/{id}             - Product detail
//! GET    /api/gifts                     - Products tagged with an occasion
//!
//! # Cart (guest or customer)
//! GET    /api/cart                      - Show cart
//! DELETE /api/cart                      - Clear cart
//! POST   /api/cart/items                - Add item
//! PATCH  /api/cart/items/{id}           - Change quantity
//! DELETE /api/cart/items/{id}           - Remove item
//! POST   /api/cart/discount             - Apply discount code
//! DELETE /api/cart/discount             - Remove discount code
//!
//! # Checkout (requires auth)
//! POST   /api/checkout                  - Place order
//!
//! # Events and landscaping
//! GET    /api/events                    - Event list
//! GET    /api/events/{id}               - Event detail
//! GET    /api/landscape/services        - Bookable services
//! POST   /api/landscape/bookings        - Request a booking
//! GET    /api/landscape/bookings        - Own bookings (requires auth)
//!
//! # Profile (requires auth)
//! GET    /api/profile                   - Profile
//! PUT    /api/profile                   - Update profile
//! GET    /api/profile/addresses         - Address book
//! POST   /api/profile/addresses         - Add address
//! PUT    /api/profile/addresses/{id}    - Update address
//! DELETE /api/profile/addresses/{id}    - Delete address
//! GET    /api/profile/orders            - Order history
//! GET    /api/profile/orders/{id}       - Order detail
//! ```

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod events;
pub mod landscape;
pub mod profile;
pub mod resources;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, patch, post, put},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter, otp_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    let send_otp = Router::new()
        .route("/send-otp", post(auth::send_otp))
        .layer(otp_rate_limiter());

    Router::new()
        .route("/verify-otp", post(auth::verify_otp))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .layer(auth_rate_limiter())
        .merge(send_otp)
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(catalog::categories))
        .route("/categories/{slug}", get(catalog::category))
        .route("/colors", get(catalog::colors))
        .route("/sizes", get(catalog::sizes))
        .route("/occasions", get(catalog::occasions))
        .route("/products", get(catalog::products))
        .route("/products/{id}", get(catalog::product))
        .route("/gifts", get(catalog::gifts))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add_item))
        .route(
            "/items/{id}",
            patch(cart::update_item).delete(cart::remove_item),
        )
        .route(
            "/discount",
            post(cart::apply_discount).delete(cart::remove_discount),
        )
}

/// Create the event and landscaping routes router.
pub fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(events::index))
        .route("/events/{id}", get(events::show))
        .route("/landscape/services", get(landscape::services))
        .route(
            "/landscape/bookings",
            get(landscape::my_bookings).post(landscape::create_booking),
        )
}

/// Create the profile routes router.
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(profile::show).put(profile::update))
        .route(
            "/addresses",
            get(profile::addresses).post(profile::create_address),
        )
        .route(
            "/addresses/{id}",
            put(profile::update_address).delete(profile::delete_address),
        )
        .route("/orders", get(profile::orders))
        .route("/orders/{id}", get(profile::order))
}

/// Create the `/api` router.
pub fn api_routes() -> Router<AppState> {
    let general = Router::new()
        .merge(catalog_routes())
        .merge(event_routes())
        .nest("/cart", cart_routes())
        .route("/checkout", post(checkout::place_order))
        .nest("/profile", profile_routes())
        .layer(api_rate_limiter());

    Router::new().merge(auth_routes()).merge(general)
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", api_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
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
