//! Petal Storefront library.
//!
//! The public JSON API behind the Petal storefront SPA: catalog browsing,
//! carts, checkout, phone OTP authentication, customer profiles, events and
//! landscaping bookings. The admin service links against this crate for the
//! shared repositories, models and error type.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod sms;
pub mod state;
pub mod telemetry;

use axum::{Router, http::Request};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the storefront application with its full middleware stack.
///
/// Layers run outermost first: Sentry, tracing, request ID, CORS, session,
/// then the per-group rate limiters inside [`routes::routes`].
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.pool(), state.config());
    let cors_layer = middleware::create_cors_layer(&state.config().cors_origins);

    Router::new()
        .merge(routes::routes())
        .layer(session_layer)
        .layer(cors_layer)
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::{OtpConfig, StorefrontConfig};

    /// State over a pool that never connects; fine for routes that fail
    /// before touching the database.
    fn test_app() -> Router {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://petal@localhost/petal_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("x".repeat(64)),
            cors_origins: vec!["http://localhost:5173".to_string()],
            pricing: petal_core::PricingConfig::default(),
            otp: OtpConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
        };
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://petal@localhost/petal_test")
            .unwrap();
        app(AppState::new(config, pool).unwrap())
    }

    fn request(method: &str, uri: &str, body: Option<&str>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", "203.0.113.7");
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app()
            .oneshot(request("GET", "/health", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_profile_requires_login() {
        let response = test_app()
            .oneshot(request("GET", "/api/profile", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error"], "Unauthenticated.");
    }

    #[tokio::test]
    async fn test_send_otp_validates_body() {
        let response = test_app()
            .oneshot(request("POST", "/api/send-otp", Some(r#"{"phone": "12"}"#)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(body["error"], "The given data was invalid.");
        assert!(body["errors"]["phone"].is_array());
    }

    #[tokio::test]
    async fn test_checkout_requires_login() {
        let response = test_app()
            .oneshot(request(
                "POST",
                "/api/checkout",
                Some(r#"{"payment_method": "cash_on_delivery"}"#),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_landscape_services_are_localized() {
        let response = test_app()
            .oneshot(request("GET", "/api/landscape/services?lang=ar", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 4);
        assert_eq!(body["data"][3]["label"], "استشارة");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = test_app()
            .oneshot(request("GET", "/api/nope", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
