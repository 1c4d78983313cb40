//! Public event listings.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use petal_core::EventId;

use super::resources::EventResource;
use crate::db::{EventRepository, Page};
use crate::error::{AppError, Result};
use crate::extract::Lang;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct EventQuery {
    /// Include events that have already finished.
    #[serde(default)]
    pub past: bool,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Active events, upcoming first.
#[instrument(skip(state, query))]
pub async fn index(
    State(state): State<AppState>,
    Lang(locale): Lang,
    Query(query): Query<EventQuery>,
) -> Result<impl IntoResponse> {
    let now = Utc::now();
    let events = EventRepository::new(state.pool())
        .list_active(query.past, Page::new(query.page, query.per_page))
        .await?
        .map(|e| EventResource::new(&e, locale, now));

    Ok(Json(events))
}

/// A single active event.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Lang(locale): Lang,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let event = EventRepository::new(state.pool())
        .get(EventId::new(id))
        .await?
        .filter(|e| e.is_active)
        .ok_or_else(|| AppError::NotFound("Event not found.".to_string()))?;

    Ok(Json(json!({ "data": EventResource::new(&event, locale, Utc::now()) })))
}
