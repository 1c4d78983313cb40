//! Petal Admin - Back-office JSON API.
//!
//! This binary serves the admin API on port 3001.
//!
//! # Security
//!
//! Binds to 127.0.0.1 by default. Expose it through a private network or an
//! authenticating proxy, never directly to the internet.
//!
//! # Architecture
//!
//! - Axum web framework serving JSON to the admin SPA
//! - `PostgreSQL` shared with the storefront, plus admin users and sessions
//!
//! Migrations are NOT run automatically on startup.
//! Run them explicitly via: `cargo run -p petal-cli -- migrate`

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;

use petal_admin::config::AdminConfig;
use petal_admin::state::AppState;
use petal_admin::{app, db};
use petal_storefront::telemetry::{init_sentry, init_tracing, shutdown_signal};

#[tokio::main]
async fn main() {
    let config = AdminConfig::from_env().expect("Failed to load configuration");

    let _sentry_guard = init_sentry(
        config.sentry_dsn.as_deref(),
        config.sentry_environment.as_deref(),
        sentry::release_name!(),
    );
    init_tracing("petal_admin=info,petal_storefront=info,tower_http=debug");

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");
    tracing::info!("admin listening on http://{}", addr);

    let app = app(AppState::new(config, pool));

    // Peer addresses feed the login rate limiter when no proxy header is present
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");
}
