//! Products, their variants and their occasion tags.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use petal_core::{CategoryId, OccasionId, ProductAttributeId, ProductId};
use petal_storefront::extract::ValidatedJson;

use super::{ListQuery, ensure_valid};
use crate::db::catalog::{AdminProductFilter, AttributeInput, ProductInput};
use crate::db::{CatalogAdminRepository, CatalogRepository};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireWriter};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OccasionsRequest {
    pub occasion_ids: Vec<OccasionId>,
}

fn product_not_found() -> AppError {
    AppError::NotFound("Product not found.".to_string())
}

fn variant_not_found() -> AppError {
    AppError::NotFound("Variant not found.".to_string())
}

// =============================================================================
// Products
// =============================================================================

#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let filter = AdminProductFilter {
        search: query.search().map(str::to_owned),
        category_id: query.category_id.map(CategoryId::new),
        is_active: query.is_active,
    };

    let products = CatalogAdminRepository::new(state.pool())
        .list_products(&filter, query.page())
        .await?;
    Ok(Json(products))
}

/// A product with its category, variants and occasions.
#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let product = CatalogRepository::new(state.pool())
        .get_product_detail(ProductId::new(id))
        .await?
        .ok_or_else(product_not_found)?;

    Ok(Json(json!({ "product": product })))
}

#[instrument(skip(state, admin, req), fields(admin_id = %admin.id, slug = %req.slug))]
pub async fn create(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    ValidatedJson(req): ValidatedJson<ProductInput>,
) -> Result<impl IntoResponse> {
    ensure_valid(req.check())?;

    let product = CatalogAdminRepository::new(state.pool())
        .create_product(&req)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Product created.", "product": product })),
    ))
}

#[instrument(skip(state, admin, req), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<i32>,
    ValidatedJson(req): ValidatedJson<ProductInput>,
) -> Result<impl IntoResponse> {
    ensure_valid(req.check())?;

    let product = CatalogAdminRepository::new(state.pool())
        .update_product(ProductId::new(id), &req)
        .await?;

    Ok(Json(
        json!({ "message": "Product updated.", "product": product }),
    ))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    CatalogAdminRepository::new(state.pool())
        .delete_product(ProductId::new(id))
        .await?;

    Ok(Json(json!({ "message": "Product deleted." })))
}

/// Replace the occasions a product is tagged with.
#[instrument(skip(state, admin, req), fields(admin_id = %admin.id, count = req.occasion_ids.len()))]
pub async fn set_occasions(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<i32>,
    Json(req): Json<OccasionsRequest>,
) -> Result<impl IntoResponse> {
    let id = ProductId::new(id);
    let catalog = CatalogRepository::new(state.pool());
    catalog.get_product(id).await?.ok_or_else(product_not_found)?;

    CatalogAdminRepository::new(state.pool())
        .set_product_occasions(id, &req.occasion_ids)
        .await?;
    let occasions = catalog.list_product_occasions(id).await?;

    Ok(Json(
        json!({ "message": "Occasions updated.", "occasions": occasions }),
    ))
}

// =============================================================================
// Variants
// =============================================================================

#[instrument(skip(state, _admin))]
pub async fn attributes(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let id = ProductId::new(id);
    let catalog = CatalogRepository::new(state.pool());
    catalog.get_product(id).await?.ok_or_else(product_not_found)?;

    let attributes = catalog.list_attributes(id).await?;
    Ok(Json(json!({ "data": attributes })))
}

#[instrument(skip(state, admin, req), fields(admin_id = %admin.id))]
pub async fn create_attribute(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<i32>,
    ValidatedJson(req): ValidatedJson<AttributeInput>,
) -> Result<impl IntoResponse> {
    let id = ProductId::new(id);
    let catalog = CatalogRepository::new(state.pool());
    catalog.get_product(id).await?.ok_or_else(product_not_found)?;

    let attribute_id = CatalogAdminRepository::new(state.pool())
        .create_attribute(id, &req)
        .await?;
    let attribute = catalog
        .get_attribute(attribute_id)
        .await?
        .ok_or_else(variant_not_found)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Variant created.", "attribute": attribute })),
    ))
}

#[instrument(skip(state, admin, req), fields(admin_id = %admin.id))]
pub async fn update_attribute(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path((id, attr_id)): Path<(i32, i32)>,
    ValidatedJson(req): ValidatedJson<AttributeInput>,
) -> Result<impl IntoResponse> {
    let attr_id = ProductAttributeId::new(attr_id);
    CatalogAdminRepository::new(state.pool())
        .update_attribute(ProductId::new(id), attr_id, &req)
        .await?;

    let attribute = CatalogRepository::new(state.pool())
        .get_attribute(attr_id)
        .await?
        .ok_or_else(variant_not_found)?;

    Ok(Json(
        json!({ "message": "Variant updated.", "attribute": attribute }),
    ))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete_attribute(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path((id, attr_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse> {
    CatalogAdminRepository::new(state.pool())
        .delete_attribute(ProductId::new(id), ProductAttributeId::new(attr_id))
        .await?;

    Ok(Json(json!({ "message": "Variant deleted." })))
}
