//! Categories and the attribute lookups: colors, sizes and occasions.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use tracing::instrument;

use petal_core::{CategoryId, ColorId, OccasionId, SizeId};
use petal_storefront::extract::ValidatedJson;

use crate::db::catalog::{CategoryInput, ColorInput, OccasionInput, SizeInput};
use crate::db::{CatalogAdminRepository, CatalogRepository};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireWriter};
use crate::state::AppState;

// =============================================================================
// Categories
// =============================================================================

/// Every category, inactive ones included.
#[instrument(skip(state, _admin))]
pub async fn categories(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<impl IntoResponse> {
    let categories = CatalogAdminRepository::new(state.pool())
        .list_categories()
        .await?;
    Ok(Json(json!({ "data": categories })))
}

#[instrument(skip(state, _admin))]
pub async fn category(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let category = CatalogRepository::new(state.pool())
        .get_category(CategoryId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found.".to_string()))?;

    Ok(Json(json!({ "category": category })))
}

#[instrument(skip(state, admin, req), fields(admin_id = %admin.id, slug = %req.slug))]
pub async fn create_category(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    ValidatedJson(req): ValidatedJson<CategoryInput>,
) -> Result<impl IntoResponse> {
    let category = CatalogAdminRepository::new(state.pool())
        .create_category(&req)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Category created.", "category": category })),
    ))
}

#[instrument(skip(state, admin, req), fields(admin_id = %admin.id))]
pub async fn update_category(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<i32>,
    ValidatedJson(req): ValidatedJson<CategoryInput>,
) -> Result<impl IntoResponse> {
    let category = CatalogAdminRepository::new(state.pool())
        .update_category(CategoryId::new(id), &req)
        .await?;

    Ok(Json(
        json!({ "message": "Category updated.", "category": category }),
    ))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete_category(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    CatalogAdminRepository::new(state.pool())
        .delete_category(CategoryId::new(id))
        .await?;

    Ok(Json(json!({ "message": "Category deleted." })))
}

// =============================================================================
// Colors
// =============================================================================

#[instrument(skip(state, _admin))]
pub async fn colors(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<impl IntoResponse> {
    let colors = CatalogRepository::new(state.pool()).list_colors().await?;
    Ok(Json(json!({ "data": colors })))
}

#[instrument(skip(state, admin, req), fields(admin_id = %admin.id))]
pub async fn create_color(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    ValidatedJson(req): ValidatedJson<ColorInput>,
) -> Result<impl IntoResponse> {
    let color = CatalogAdminRepository::new(state.pool())
        .create_color(&req)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Color created.", "color": color })),
    ))
}

#[instrument(skip(state, admin, req), fields(admin_id = %admin.id))]
pub async fn update_color(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<i32>,
    ValidatedJson(req): ValidatedJson<ColorInput>,
) -> Result<impl IntoResponse> {
    let color = CatalogAdminRepository::new(state.pool())
        .update_color(ColorId::new(id), &req)
        .await?;

    Ok(Json(json!({ "message": "Color updated.", "color": color })))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete_color(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    CatalogAdminRepository::new(state.pool())
        .delete_color(ColorId::new(id))
        .await?;

    Ok(Json(json!({ "message": "Color deleted." })))
}

// =============================================================================
// Sizes
// =============================================================================

#[instrument(skip(state, _admin))]
pub async fn sizes(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<impl IntoResponse> {
    let sizes = CatalogRepository::new(state.pool()).list_sizes().await?;
    Ok(Json(json!({ "data": sizes })))
}

#[instrument(skip(state, admin, req), fields(admin_id = %admin.id))]
pub async fn create_size(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    ValidatedJson(req): ValidatedJson<SizeInput>,
) -> Result<impl IntoResponse> {
    let size = CatalogAdminRepository::new(state.pool())
        .create_size(&req)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Size created.", "size": size })),
    ))
}

#[instrument(skip(state, admin, req), fields(admin_id = %admin.id))]
pub async fn update_size(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<i32>,
    ValidatedJson(req): ValidatedJson<SizeInput>,
) -> Result<impl IntoResponse> {
    let size = CatalogAdminRepository::new(state.pool())
        .update_size(SizeId::new(id), &req)
        .await?;

    Ok(Json(json!({ "message": "Size updated.", "size": size })))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete_size(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    CatalogAdminRepository::new(state.pool())
        .delete_size(SizeId::new(id))
        .await?;

    Ok(Json(json!({ "message": "Size deleted." })))
}

// =============================================================================
// Occasions
// =============================================================================

#[instrument(skip(state, _admin))]
pub async fn occasions(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<impl IntoResponse> {
    let occasions = CatalogRepository::new(state.pool())
        .list_occasions()
        .await?;
    Ok(Json(json!({ "data": occasions })))
}

#[instrument(skip(state, admin, req), fields(admin_id = %admin.id, slug = %req.slug))]
pub async fn create_occasion(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    ValidatedJson(req): ValidatedJson<OccasionInput>,
) -> Result<impl IntoResponse> {
    let occasion = CatalogAdminRepository::new(state.pool())
        .create_occasion(&req)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Occasion created.", "occasion": occasion })),
    ))
}

#[instrument(skip(state, admin, req), fields(admin_id = %admin.id))]
pub async fn update_occasion(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<i32>,
    ValidatedJson(req): ValidatedJson<OccasionInput>,
) -> Result<impl IntoResponse> {
    let occasion = CatalogAdminRepository::new(state.pool())
        .update_occasion(OccasionId::new(id), &req)
        .await?;

    Ok(Json(
        json!({ "message": "Occasion updated.", "occasion": occasion }),
    ))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete_occasion(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    CatalogAdminRepository::new(state.pool())
        .delete_occasion(OccasionId::new(id))
        .await?;

    Ok(Json(json!({ "message": "Occasion deleted." })))
}
