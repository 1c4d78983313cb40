//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! petal migrate
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string shared by both services
//!
//! Runs the SQL migrations in `migrations/` at the workspace root, then
//! creates the session tables: `tower_sessions.session` for the storefront
//! and `tower_sessions.admin_session` for admin.

use thiserror::Error;
use tower_sessions_sqlx_store::PostgresStore;

use super::{ConnectError, connect};

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run all migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the connection or any migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let pool = connect().await?;

    tracing::info!("Running database migrations...");
    sqlx::migrate!("../../migrations").run(&pool).await?;

    tracing::info!("Creating session tables...");
    PostgresStore::new(pool.clone()).migrate().await?;
    petal_admin::middleware::session_store(&pool).migrate().await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
