//! Dashboard route handler.

use axum::{Json, extract::State, response::IntoResponse};
use tracing::instrument;

use crate::db::dashboard;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<impl IntoResponse> {
    let dashboard = dashboard::load(state.pool()).await?;
    Ok(Json(dashboard))
}
