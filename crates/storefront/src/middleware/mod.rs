//! HTTP middleware stack for the storefront API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS (allowed SPA origins)
//! 5. Session layer (tower-sessions with `PostgreSQL` store)
//! 6. Rate limiting (governor, per route group)

pub mod auth;
pub mod cors;
pub mod rate_limit;
pub mod request_id;
pub mod session;

pub use auth::{
    CurrentCart, OptionalAuth, RequireAuth, clear_current_customer, guest_cart_token,
    session_error, set_current_customer, set_verified_phone, verified_phone,
};
pub use cors::create_cors_layer;
pub use rate_limit::{api_rate_limiter, auth_rate_limiter, otp_rate_limiter};
pub use request_id::request_id_middleware;
pub use session::create_session_layer;
