//! Event administration.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use tracing::instrument;

use petal_core::EventId;
use petal_storefront::extract::ValidatedJson;

use super::{ListQuery, ensure_valid};
use crate::db::events::EventInput;
use crate::db::{EventAdminRepository, EventRepository};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireWriter};
use crate::state::AppState;

/// All events, inactive and past ones included, latest start first.
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let events = EventAdminRepository::new(state.pool())
        .list(query.page())
        .await?;
    Ok(Json(events))
}

#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let event = EventRepository::new(state.pool())
        .get(EventId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found.".to_string()))?;

    Ok(Json(json!({ "event": event })))
}

#[instrument(skip(state, admin, req), fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    ValidatedJson(req): ValidatedJson<EventInput>,
) -> Result<impl IntoResponse> {
    ensure_valid(req.check())?;

    let event = EventAdminRepository::new(state.pool()).create(&req).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Event created.", "event": event })),
    ))
}

#[instrument(skip(state, admin, req), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<i32>,
    ValidatedJson(req): ValidatedJson<EventInput>,
) -> Result<impl IntoResponse> {
    ensure_valid(req.check())?;

    let event = EventAdminRepository::new(state.pool())
        .update(EventId::new(id), &req)
        .await?;

    Ok(Json(json!({ "message": "Event updated.", "event": event })))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    EventAdminRepository::new(state.pool())
        .delete(EventId::new(id))
        .await?;

    Ok(Json(json!({ "message": "Event deleted." })))
}
