//! Request extractors shared by the storefront and admin routes.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Request, rejection::JsonRejection},
    http::{header, request::Parts},
};
use serde::de::DeserializeOwned;
use validator::Validate;

use petal_core::Locale;

use crate::error::AppError;

/// JSON body that is deserialized and then validated with `validator`.
///
/// Malformed JSON and rule violations both produce a 422 with field errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection)?;
        value.validate()?;
        Ok(Self(value))
    }
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            AppError::BadRequest("Expected a JSON request body".to_string())
        }
        other => AppError::field("body", other.body_text()),
    }
}

/// Content language of the response: `?lang=ar|en`, else `Accept-Language`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Lang(pub Locale);

impl<S> FromRequestParts<S> for Lang
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let from_query = parts.uri.query().and_then(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == "lang")
                .and_then(|(_, value)| match value.as_ref() {
                    "ar" => Some(Locale::Ar),
                    "en" => Some(Locale::En),
                    _ => None,
                })
        });

        let locale = from_query.unwrap_or_else(|| {
            parts
                .headers
                .get(header::ACCEPT_LANGUAGE)
                .and_then(|v| v.to_str().ok())
                .map(Locale::from_accept_language)
                .unwrap_or_default()
        });

        Ok(Self(locale))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::StatusCode,
        routing::{get, post},
    };
    use serde::Deserialize;
    use tower::ServiceExt;

    use super::*;

    #[derive(Debug, Deserialize, Validate)]
    struct Quantity {
        #[validate(range(min = 1, max = 99))]
        quantity: i32,
    }

    fn app() -> Router {
        Router::new()
            .route(
                "/qty",
                post(|ValidatedJson(q): ValidatedJson<Quantity>| async move {
                    q.quantity.to_string()
                }),
            )
            .route("/lang", get(|Lang(l): Lang| async move { l.code() }))
    }

    async fn send(req: axum::http::Request<Body>) -> (StatusCode, String) {
        let response = app().oneshot(req).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn post_json(body: &str) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .method("POST")
            .uri("/qty")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_body_passes() {
        let (status, body) = send(post_json(r#"{"quantity": 3}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "3");
    }

    #[tokio::test]
    async fn test_rule_violation_is_422() {
        let (status, body) = send(post_json(r#"{"quantity": 0}"#)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body.contains("\"quantity\""));
    }

    #[tokio::test]
    async fn test_malformed_json_is_422() {
        let (status, body) = send(post_json(r#"{"quantity": "#)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body.contains("The given data was invalid."));
    }

    #[tokio::test]
    async fn test_lang_from_query_and_header() {
        let req = axum::http::Request::builder()
            .uri("/lang?lang=ar")
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(req).await.1, "ar");

        let req = axum::http::Request::builder()
            .uri("/lang")
            .header(header::ACCEPT_LANGUAGE, "ar-SA,ar;q=0.9,en;q=0.8")
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(req).await.1, "ar");

        let req = axum::http::Request::builder()
            .uri("/lang")
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(req).await.1, "en");
    }
}
