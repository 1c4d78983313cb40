//! HTTP middleware stack for admin.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (shared with the storefront)
//! 4. CORS (admin SPA origins, when configured)
//! 5. Session layer (tower-sessions with `PostgreSQL` store)
//! 6. Auth extractors (`RequireAdmin`, `RequireWriter`, `RequireSuperAdmin`)

pub mod auth;
pub mod session;

pub use auth::{
    RequireAdmin, RequireSuperAdmin, RequireWriter, clear_current_admin, set_current_admin,
};
pub use petal_storefront::middleware::{
    auth_rate_limiter, create_cors_layer, request_id_middleware, session_error,
};
pub use session::{create_session_layer, session_store};
