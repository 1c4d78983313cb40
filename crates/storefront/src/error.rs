//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`; the body is always `{"error": "..."}`, with a
//! field map under `errors` for validation failures.

use std::collections::BTreeMap;

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::db::RepositoryError;
use crate::services::{AuthError, CartError, CheckoutError, OrderError, OtpError, PaymentError};

/// Message of every 422 validation response.
pub const VALIDATION_MESSAGE: &str = "The given data was invalid.";

/// Field name to messages.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    #[error("OTP error: {0}")]
    Otp(#[from] OtpError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Request data failed validation.
    #[error("Validation failed")]
    Validation(FieldErrors),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller may not perform this action.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request conflicts with existing data.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// A validation error on a single field.
    #[must_use]
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        Self::Validation(errors)
    }

    /// Status code and client-safe message.
    fn classify(&self) -> (StatusCode, String) {
        match self {
            Self::Database(err) => classify_repository(err),
            Self::Otp(err) => classify_otp(err),
            Self::Auth(err) => match err {
                AuthError::Otp(inner) => classify_otp(inner),
                AuthError::InvalidEmail(_) => unprocessable("Invalid email address"),
                AuthError::AlreadyRegistered => (StatusCode::CONFLICT, capitalize(&err.to_string())),
                AuthError::NotRegistered => (StatusCode::NOT_FOUND, capitalize(&err.to_string())),
                AuthError::AccountDisabled => (StatusCode::FORBIDDEN, capitalize(&err.to_string())),
                AuthError::Repository(inner) => classify_repository(inner),
            },
            Self::Cart(err) => match err {
                CartError::ItemNotFound => (StatusCode::NOT_FOUND, capitalize(&err.to_string())),
                CartError::Repository(inner) => classify_repository(inner),
                _ => unprocessable(&err.to_string()),
            },
            Self::Checkout(err) => match err {
                CheckoutError::AddressNotFound => {
                    (StatusCode::NOT_FOUND, capitalize(&err.to_string()))
                }
                CheckoutError::Repository(inner) => classify_repository(inner),
                _ => unprocessable(&err.to_string()),
            },
            Self::Payment(err) => match err {
                PaymentError::NotFound | PaymentError::OrderNotFound => {
                    (StatusCode::NOT_FOUND, capitalize(&err.to_string()))
                }
                PaymentError::Repository(inner) => classify_repository(inner),
                _ => unprocessable(&err.to_string()),
            },
            Self::Order(err) => match err {
                OrderError::NotFound => (StatusCode::NOT_FOUND, capitalize(&err.to_string())),
                OrderError::Transition(_) => unprocessable(&err.to_string()),
                OrderError::Repository(inner) => classify_repository(inner),
            },
            Self::Validation(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                VALIDATION_MESSAGE.to_string(),
            ),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            Self::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests".to_string(),
            ),
            Self::Internal(_) => internal(),
        }
    }

    fn retry_after(&self) -> Option<u64> {
        match self {
            Self::Otp(OtpError::TooSoon { retry_after_secs })
            | Self::Auth(AuthError::Otp(OtpError::TooSoon { retry_after_secs })) => {
                Some(*retry_after_secs)
            }
            _ => None,
        }
    }

    fn field_errors(&self) -> Option<FieldErrors> {
        match self {
            Self::Validation(errors) => Some(errors.clone()),
            Self::Otp(OtpError::InvalidPhone(err))
            | Self::Auth(AuthError::Otp(OtpError::InvalidPhone(err))) => {
                Some(BTreeMap::from([("phone".to_string(), vec![capitalize(&err.to_string())])]))
            }
            _ => None,
        }
    }
}

fn unprocessable(message: &str) -> (StatusCode, String) {
    (StatusCode::UNPROCESSABLE_ENTITY, capitalize(message))
}

fn internal() -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

fn classify_repository(err: &RepositoryError) -> (StatusCode, String) {
    match err {
        RepositoryError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
        RepositoryError::Conflict(msg) => (StatusCode::CONFLICT, capitalize(msg)),
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => internal(),
    }
}

fn classify_otp(err: &OtpError) -> (StatusCode, String) {
    match err {
        OtpError::InvalidPhone(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            VALIDATION_MESSAGE.to_string(),
        ),
        OtpError::TooSoon { .. } => (StatusCode::TOO_MANY_REQUESTS, capitalize(&err.to_string())),
        OtpError::InvalidCode => (
            StatusCode::UNAUTHORIZED,
            "The verification code is invalid or has expired.".to_string(),
        ),
        OtpError::Delivery(_) => (
            StatusCode::BAD_GATEWAY,
            "Could not send the verification code, please try again later.".to_string(),
        ),
        OtpError::Repository(inner) => classify_repository(inner),
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.classify();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = match self.field_errors() {
            Some(errors) => json!({ "error": message, "errors": errors }),
            None => json!({ "error": message }),
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = self.retry_after()
            && let Ok(value) = HeaderValue::from_str(&secs.to_string())
        {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
        response
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        collect_validation_errors("", &errors, &mut fields);
        Self::Validation(fields)
    }
}

fn collect_validation_errors(prefix: &str, errors: &ValidationErrors, out: &mut FieldErrors) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                let messages = list.iter().map(|e| validation_message(&path, e));
                out.entry(path.clone()).or_default().extend(messages);
            }
            ValidationErrorsKind::Struct(inner) => collect_validation_errors(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_validation_errors(&format!("{path}.{index}"), inner, out);
                }
            }
        }
    }
}

fn validation_message(path: &str, error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }

    let name = path.rsplit('.').next().unwrap_or(path).replace('_', " ");
    match error.code.as_ref() {
        "required" => format!("The {name} field is required."),
        "length" => format!("The {name} field has an invalid length."),
        "range" => format!("The {name} field is out of range."),
        "email" => format!("The {name} field must be a valid email address."),
        _ => format!("The {name} field is invalid."),
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context.
///
/// Call this after successful authentication to associate errors with
/// customers.
pub fn set_sentry_user(user_id: &impl ToString, phone: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: phone.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the customer.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for customer actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;
    use petal_core::DiscountError;
    use serde::Deserialize;
    use validator::Validate;

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    async fn body_json(err: AppError) -> serde_json::Value {
        let body = to_bytes(err.into_response().into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_domain_error_status_codes() {
        assert_eq!(
            get_status(OtpError::InvalidCode.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(OtpError::TooSoon { retry_after_secs: 12 }.into()),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AuthError::AlreadyRegistered.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(CartError::InsufficientStock { available: 1 }.into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(CartError::Discount(DiscountError::Expired).into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(CheckoutError::EmptyCart.into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(PaymentError::NotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(RepositoryError::Conflict("slug taken".to_string()).into()),
            StatusCode::CONFLICT
        );
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let err = AppError::Database(RepositoryError::DataCorruption("bad phone".to_string()));
        let body = body_json(err).await;
        assert_eq!(body["error"], "Internal server error");
    }

    #[tokio::test]
    async fn test_too_soon_sets_retry_after() {
        let response = AppError::from(OtpError::TooSoon { retry_after_secs: 17 }).into_response();
        assert_eq!(
            response.headers().get(header::RETRY_AFTER).unwrap(),
            "17"
        );
    }

    #[derive(Debug, Deserialize, Validate)]
    struct Signup {
        #[validate(length(min = 2, max = 100))]
        name: String,
        #[validate(email)]
        email: String,
    }

    #[tokio::test]
    async fn test_validation_errors_body() {
        let input = Signup {
            name: "A".to_string(),
            email: "nope".to_string(),
        };
        let err = AppError::from(input.validate().unwrap_err());
        let body = body_json(err).await;

        assert_eq!(body["error"], VALIDATION_MESSAGE);
        assert_eq!(body["errors"]["name"][0], "The name field has an invalid length.");
        assert_eq!(
            body["errors"]["email"][0],
            "The email field must be a valid email address."
        );
    }

    #[tokio::test]
    async fn test_invalid_phone_is_field_error() {
        let err = AppError::from(OtpError::InvalidPhone(petal_core::PhoneError::Empty));
        let body = body_json(err).await;
        assert!(body["errors"]["phone"].is_array());
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("only 2 left"), "Only 2 left");
        assert_eq!(capitalize(""), "");
    }
}
