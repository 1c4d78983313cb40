//! Discount code administration.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use tracing::instrument;

use petal_core::DiscountId;
use petal_storefront::extract::ValidatedJson;

use super::{ListQuery, ensure_valid};
use crate::db::discounts::DiscountInput;
use crate::db::{DiscountAdminRepository, DiscountRepository};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireWriter};
use crate::state::AppState;

#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let discounts = DiscountAdminRepository::new(state.pool())
        .list(query.search(), query.page())
        .await?;
    Ok(Json(discounts))
}

#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let discount = DiscountRepository::new(state.pool())
        .get_by_id(DiscountId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound("Discount not found.".to_string()))?;

    Ok(Json(json!({ "discount": discount })))
}

#[instrument(skip(state, admin, req), fields(admin_id = %admin.id, code = %req.code))]
pub async fn create(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    ValidatedJson(req): ValidatedJson<DiscountInput>,
) -> Result<impl IntoResponse> {
    ensure_valid(req.check())?;

    let discount = DiscountAdminRepository::new(state.pool())
        .create(&req)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Discount created.", "discount": discount })),
    ))
}

#[instrument(skip(state, admin, req), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<i32>,
    ValidatedJson(req): ValidatedJson<DiscountInput>,
) -> Result<impl IntoResponse> {
    ensure_valid(req.check())?;

    let discount = DiscountAdminRepository::new(state.pool())
        .update(DiscountId::new(id), &req)
        .await?;

    Ok(Json(
        json!({ "message": "Discount updated.", "discount": discount }),
    ))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    DiscountAdminRepository::new(state.pool())
        .delete(DiscountId::new(id))
        .await?;

    Ok(Json(json!({ "message": "Discount deleted." })))
}
