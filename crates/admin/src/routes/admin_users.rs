//! Admin user management (super admins only).

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use validator::Validate;

use petal_core::{AdminRole, AdminUserId};
use petal_storefront::extract::ValidatedJson;

use crate::db::AdminUserRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireSuperAdmin;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAdminRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 2, max = 100))]
    pub name: String,
    pub role: AdminRole,
    #[validate(length(max = 255))]
    pub password: String,
}

#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireSuperAdmin(_admin): RequireSuperAdmin,
) -> Result<impl IntoResponse> {
    let users = AdminUserRepository::new(state.pool()).list_all().await?;
    Ok(Json(json!({ "data": users })))
}

#[instrument(skip(state, admin, req), fields(admin_id = %admin.id, role = %req.role))]
pub async fn create(
    State(state): State<AppState>,
    RequireSuperAdmin(admin): RequireSuperAdmin,
    ValidatedJson(req): ValidatedJson<CreateAdminRequest>,
) -> Result<impl IntoResponse> {
    let user = state
        .auth()
        .create_admin(&req.email, &req.name, req.role, &req.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Admin user created.", "admin": user })),
    ))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireSuperAdmin(admin): RequireSuperAdmin,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let id = AdminUserId::new(id);
    if id == admin.id {
        return Err(AppError::BadRequest(
            "You cannot delete your own account.".to_string(),
        ));
    }

    state.auth().delete_admin(id).await?;
    Ok(Json(json!({ "message": "Admin user deleted." })))
}
