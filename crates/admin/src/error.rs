//! Error handling for the admin service.
//!
//! Handlers share the storefront's `AppError`, so both services answer with
//! the same `{"error": ...}` bodies and Sentry capture rules. Admin-only
//! failures are converted here.

pub use petal_storefront::error::{AppError, Result};

use crate::services::AdminAuthError;

impl From<AdminAuthError> for AppError {
    fn from(err: AdminAuthError) -> Self {
        match err {
            AdminAuthError::InvalidCredentials => {
                Self::Unauthorized("These credentials do not match our records.".to_string())
            }
            AdminAuthError::InvalidEmail(e) => Self::field("email", capitalize(&e.to_string())),
            AdminAuthError::WeakPassword { min } => Self::field(
                "password",
                format!("The password must be at least {min} characters."),
            ),
            AdminAuthError::UserNotFound => Self::NotFound("Admin user not found".to_string()),
            AdminAuthError::UserAlreadyExists => {
                Self::Conflict("An admin with this email already exists".to_string())
            }
            AdminAuthError::PasswordHash(msg) => Self::Internal(msg),
            AdminAuthError::Repository(e) => Self::Database(e),
        }
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use super::*;

    #[test]
    fn test_invalid_credentials_is_401() {
        let response = AppError::from(AdminAuthError::InvalidCredentials).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_duplicate_admin_is_409() {
        let response = AppError::from(AdminAuthError::UserAlreadyExists).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_weak_password_is_field_error() {
        let Err(AppError::Validation(errors)) =
            Err::<(), _>(AppError::from(AdminAuthError::WeakPassword { min: 12 }))
        else {
            panic!("expected a validation error");
        };
        assert_eq!(
            errors["password"],
            vec!["The password must be at least 12 characters.".to_string()]
        );
    }
}
