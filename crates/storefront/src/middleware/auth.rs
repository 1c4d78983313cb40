//! Authentication extractors and session helpers.
//!
//! Customers authenticate by phone OTP; the logged-in identity, a phone
//! verified ahead of registration and the guest cart token all live in the
//! tower-sessions session.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;
use uuid::Uuid;

use petal_core::Phone;

use crate::error::AppError;
use crate::models::{CurrentCustomer, session_keys};
use crate::services::CartOwner;

/// Extractor that requires a logged-in customer.
///
/// Rejects with `401 {"error": "Unauthenticated."}` otherwise.
///
/// # Example
///
/// ```rust,ignore
/// async fn profile(RequireAuth(customer): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", customer.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentCustomer);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = session_from_parts(parts)?;

        let customer: CurrentCustomer = session
            .get(session_keys::CURRENT_CUSTOMER)
            .await
            .ok()
            .flatten()
            .ok_or_else(|| AppError::Unauthorized("Unauthenticated.".to_string()))?;

        Ok(Self(customer))
    }
}

/// Extractor that optionally gets the current customer.
pub struct OptionalAuth(pub Option<CurrentCustomer>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let customer = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentCustomer>(session_keys::CURRENT_CUSTOMER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(customer))
    }
}

/// Extractor resolving whose cart the request works on.
///
/// Logged-in customers use their own cart; guests get a random token stored
/// in the session on first use.
pub struct CurrentCart(pub CartOwner);

impl<S> FromRequestParts<S> for CurrentCart
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = session_from_parts(parts)?;

        if let Some(customer) = session
            .get::<CurrentCustomer>(session_keys::CURRENT_CUSTOMER)
            .await
            .ok()
            .flatten()
        {
            return Ok(Self(CartOwner::Customer(customer.id)));
        }

        let token = match guest_cart_token(&session).await {
            Some(token) => token,
            None => {
                let token = Uuid::new_v4();
                session
                    .insert(session_keys::CART_TOKEN, token)
                    .await
                    .map_err(session_error)?;
                token
            }
        };

        Ok(Self(CartOwner::Guest(token)))
    }
}

fn session_from_parts(parts: &Parts) -> Result<Session, AppError> {
    parts
        .extensions
        .get::<Session>()
        .cloned()
        .ok_or_else(|| AppError::Internal("session layer missing".to_string()))
}

/// Map a session store failure.
#[must_use]
pub fn session_error(err: tower_sessions::session::Error) -> AppError {
    AppError::Internal(format!("session error: {err}"))
}

/// Set the current customer in the session.
///
/// Cycles the session id to prevent fixation.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_customer(
    session: &Session,
    customer: &CurrentCustomer,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session
        .insert(session_keys::CURRENT_CUSTOMER, customer)
        .await?;
    session
        .remove::<Phone>(session_keys::VERIFIED_PHONE)
        .await?;
    Ok(())
}

/// Clear the current customer from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_customer(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

/// Remember a phone proven by OTP for a following register or login call.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_verified_phone(
    session: &Session,
    phone: &Phone,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::VERIFIED_PHONE, phone).await
}

/// The phone proven by OTP earlier in this session, if any.
pub async fn verified_phone(session: &Session) -> Option<Phone> {
    session
        .get::<Phone>(session_keys::VERIFIED_PHONE)
        .await
        .ok()
        .flatten()
}

/// The guest cart token of this session, if any.
pub async fn guest_cart_token(session: &Session) -> Option<Uuid> {
    session
        .get::<Uuid>(session_keys::CART_TOKEN)
        .await
        .ok()
        .flatten()
}
