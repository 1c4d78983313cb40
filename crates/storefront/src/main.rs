//! Petal Storefront - Public JSON API.
//!
//! This binary serves the storefront API on port 3000.
//!
//! # Architecture
//!
//! - Axum web framework serving JSON to the storefront SPA
//! - `PostgreSQL` for catalog, carts, orders and sessions
//! - Twilio or Vonage for one-time password delivery
//!
//! Migrations are NOT run automatically on startup.
//! Run them explicitly via: `cargo run -p petal-cli -- migrate`

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;

use petal_storefront::config::StorefrontConfig;
use petal_storefront::state::AppState;
use petal_storefront::telemetry::{init_sentry, init_tracing, shutdown_signal};
use petal_storefront::{app, db};

#[tokio::main]
async fn main() {
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    let _sentry_guard = init_sentry(
        config.sentry_dsn.as_deref(),
        config.sentry_environment.as_deref(),
        sentry::release_name!(),
    );
    init_tracing("petal_storefront=info,tower_http=debug");

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    let state = AppState::new(config.clone(), pool)
        .expect("Failed to initialize application state");
    tracing::info!(provider = state.otp_sender().name(), "OTP delivery configured");

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");
    tracing::info!("storefront listening on {}", addr);

    // Peer addresses feed the rate limiter when no proxy header is present
    axum::serve(
        listener,
        app(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");
}
