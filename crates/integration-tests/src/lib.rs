//! HTTP integration tests for Petal.
//!
//! # Running Tests
//!
//! ```bash
//! # Prepare the database
//! cargo run -p petal-cli -- migrate
//! cargo run -p petal-cli -- seed catalog
//! cargo run -p petal-cli -- admin create -e admin@example.com -n Admin -r super_admin -p '<password>'
//!
//! # Start both services (OTP_PROVIDER=sandbox), then
//! ADMIN_TEST_EMAIL=admin@example.com ADMIN_TEST_PASSWORD='<password>' \
//!     cargo test -p petal-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_TEST_URL` - storefront base URL (default `http://localhost:3000`)
//! - `ADMIN_TEST_URL` - admin base URL (default `http://localhost:3001`)
//! - `ADMIN_TEST_EMAIL`, `ADMIN_TEST_PASSWORD` - a writable admin account
//! - `DATABASE_URL` - the database both services use, for tests that set up
//!   customers and orders directly

use rand::Rng;
use reqwest::{Client, StatusCode};
use secrecy::SecretString;
use serde_json::{Value, json};
use sqlx::PgPool;

fn env_or(key: &str, default: &str) -> String {
    dotenvy::dotenv().ok();
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Base URL of the storefront API.
#[must_use]
pub fn storefront_url() -> String {
    env_or("STOREFRONT_TEST_URL", "http://localhost:3000")
}

/// Base URL of the admin API.
#[must_use]
pub fn admin_url() -> String {
    env_or("ADMIN_TEST_URL", "http://localhost:3001")
}

/// A pool on the services' database.
///
/// # Panics
///
/// Panics if `DATABASE_URL` is not set or the database is unreachable.
pub async fn test_pool() -> PgPool {
    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL not set");
    petal_storefront::db::create_pool(&SecretString::from(url))
        .await
        .expect("Failed to connect to database")
}

/// A client that keeps session cookies between requests.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// A client logged in to admin with the test account.
///
/// # Panics
///
/// Panics if the credentials are not configured or the login fails.
pub async fn admin_client() -> Client {
    let email = std::env::var("ADMIN_TEST_EMAIL").expect("ADMIN_TEST_EMAIL not set");
    let password = std::env::var("ADMIN_TEST_PASSWORD").expect("ADMIN_TEST_PASSWORD not set");

    let client = client();
    let resp = client
        .post(format!("{}/auth/login", admin_url()))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to log in");
    assert_eq!(resp.status(), StatusCode::OK, "admin login failed");

    client
}

/// A lowercase suffix for slugs and codes that must be unique per run.
#[must_use]
pub fn unique_suffix() -> String {
    format!("{:08x}", rand::rng().random::<u32>())
}

/// Read a JSON body.
///
/// # Panics
///
/// Panics if the body is not JSON.
pub async fn json_body(resp: reqwest::Response) -> Value {
    resp.json().await.expect("Response body is not JSON")
}
