//! Phone OTP authentication handlers.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;
use tracing::{instrument, warn};
use validator::Validate;

use petal_core::OtpChannel;

use crate::error::{Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::extract::ValidatedJson;
use crate::middleware::{
    clear_current_customer, guest_cart_token, session_error, set_current_customer,
    set_verified_phone, verified_phone,
};
use crate::models::{CurrentCustomer, Customer};
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct SendOtpRequest {
    #[validate(length(min = 6, max = 24))]
    pub phone: String,
    #[serde(default)]
    pub channel: OtpChannel,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(length(min = 6, max = 24))]
    pub phone: String,
    #[validate(length(equal = 6, message = "The code must be 6 digits."))]
    pub code: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 6, max = 24))]
    pub phone: String,
    /// Optional when the phone was verified earlier in this session.
    #[validate(length(equal = 6, message = "The code must be 6 digits."))]
    pub code: Option<String>,
    #[validate(length(min = 2, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 6, max = 24))]
    pub phone: String,
    /// Optional when the phone was verified earlier in this session.
    #[validate(length(equal = 6, message = "The code must be 6 digits."))]
    pub code: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Send a verification code.
#[instrument(skip(state, req), fields(channel = %req.channel))]
pub async fn send_otp(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SendOtpRequest>,
) -> Result<impl IntoResponse> {
    let sent = state.otp().send(&req.phone, req.channel).await?;

    Ok(Json(json!({
        "message": "Verification code sent.",
        "phone": sent.phone,
        "channel": sent.channel,
        "expires_in": sent.expires_in.as_secs(),
    })))
}

/// Verify a code without logging in.
///
/// The verified phone is remembered in the session so the SPA can follow up
/// with `register` (new customers) or `login` without a second code.
#[instrument(skip(state, session, req))]
pub async fn verify_otp(
    State(state): State<AppState>,
    session: Session,
    ValidatedJson(req): ValidatedJson<VerifyOtpRequest>,
) -> Result<impl IntoResponse> {
    let phone = state.otp().verify(&req.phone, &req.code).await?;
    set_verified_phone(&session, &phone)
        .await
        .map_err(session_error)?;

    let registered = crate::db::CustomerRepository::new(state.pool())
        .get_by_phone(&phone)
        .await?
        .is_some();

    Ok(Json(json!({
        "verified": true,
        "phone": phone,
        "registered": registered,
    })))
}

/// Create an account for a verified phone and log it in.
#[instrument(skip(state, session, req))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let auth = state.auth();
    let remembered = verified_phone(&session).await;
    let phone = auth
        .confirm_phone(&req.phone, req.code.as_deref(), remembered.as_ref())
        .await?;
    // A consumed code must not be needed again if registration fails below.
    set_verified_phone(&session, &phone)
        .await
        .map_err(session_error)?;

    let customer = auth.register(&phone, &req.name, req.email.as_deref()).await?;
    start_session(&state, &session, &customer).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Registered.", "customer": customer })),
    ))
}

/// Log in with a verified phone.
#[instrument(skip(state, session, req))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse> {
    let auth = state.auth();
    let remembered = verified_phone(&session).await;
    let phone = auth
        .confirm_phone(&req.phone, req.code.as_deref(), remembered.as_ref())
        .await?;
    set_verified_phone(&session, &phone)
        .await
        .map_err(session_error)?;

    let customer = auth.login(&phone).await?;
    start_session(&state, &session, &customer).await?;

    Ok(Json(json!({ "message": "Logged in.", "customer": customer })))
}

/// Log out and drop the session.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<impl IntoResponse> {
    clear_current_customer(&session)
        .await
        .map_err(session_error)?;
    clear_sentry_user();

    Ok(Json(json!({ "message": "Logged out." })))
}

/// Store the customer in the session and adopt their guest cart.
async fn start_session(state: &AppState, session: &Session, customer: &Customer) -> Result<()> {
    let guest_token = guest_cart_token(session).await;

    let current = CurrentCustomer {
        id: customer.id,
        phone: customer.phone.clone(),
        name: customer.name.clone(),
    };
    set_current_customer(session, &current)
        .await
        .map_err(session_error)?;

    if let Some(token) = guest_token {
        // A failed adoption leaves the guest cart behind; the login stands.
        if let Err(e) = state.carts().adopt_guest_cart(customer.id, token).await {
            warn!(error = %e, customer_id = %customer.id, "Guest cart adoption failed");
        }
        session
            .remove::<uuid::Uuid>(crate::models::session_keys::CART_TOKEN)
            .await
            .map_err(session_error)?;
    }

    set_sentry_user(&customer.id, Some(customer.phone.as_str()));
    add_breadcrumb("auth", "Customer logged in", None);
    Ok(())
}
