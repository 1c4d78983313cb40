//! Admin login, logout and session identity.

use axum::{Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;
use tracing::{info, instrument};
use validator::Validate;

use petal_storefront::error::{clear_sentry_user, set_sentry_user};
use petal_storefront::extract::ValidatedJson;

use crate::db::AdminUserRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, clear_current_admin, session_error, set_current_admin};
use crate::models::CurrentAdmin;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 255))]
    pub password: String,
}

#[instrument(skip(state, session, req))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse> {
    let user = state.auth().login(&req.email, &req.password).await?;

    set_current_admin(&session, &CurrentAdmin::from(&user))
        .await
        .map_err(session_error)?;
    set_sentry_user(&user.id, None);

    info!(admin_id = %user.id, role = %user.role, "Admin logged in");
    Ok(Json(json!({ "message": "Logged in.", "admin": user })))
}

#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<impl IntoResponse> {
    clear_current_admin(&session)
        .await
        .map_err(session_error)?;
    clear_sentry_user();

    Ok(Json(json!({ "message": "Logged out." })))
}

/// The logged-in admin, re-read so role changes and deletions show up.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn me(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<impl IntoResponse> {
    let user = AdminUserRepository::new(state.pool())
        .get_by_id(admin.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Unauthenticated.".to_string()))?;

    Ok(Json(json!({ "admin": user })))
}
