//! Landscaping booking administration.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use validator::Validate;

use petal_core::{BookingStatus, LandscapeBookingId};
use petal_storefront::extract::ValidatedJson;

use super::ListQuery;
use crate::db::BookingRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireWriter};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBookingRequest {
    pub status: BookingStatus,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

fn booking_not_found() -> AppError {
    AppError::NotFound("Booking not found.".to_string())
}

#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let bookings = BookingRepository::new(state.pool())
        .list(query.status()?, query.page())
        .await?;
    Ok(Json(bookings))
}

#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let booking = BookingRepository::new(state.pool())
        .get(LandscapeBookingId::new(id))
        .await?
        .ok_or_else(booking_not_found)?;

    Ok(Json(json!({ "booking": booking })))
}

/// Update notes and, when it changes, move the status along its lifecycle.
#[instrument(skip(state, admin, req), fields(admin_id = %admin.id, status = %req.status))]
pub async fn update(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<i32>,
    ValidatedJson(req): ValidatedJson<UpdateBookingRequest>,
) -> Result<impl IntoResponse> {
    let id = LandscapeBookingId::new(id);
    let bookings = BookingRepository::new(state.pool());
    let current = bookings.get(id).await?.ok_or_else(booking_not_found)?;

    if current.status != req.status {
        current
            .status
            .transition_to(req.status)
            .map_err(|e| AppError::field("status", e.to_string()))?;
    }

    let booking = bookings
        .update(id, req.status, req.notes.as_deref())
        .await?;
    if current.status != booking.status {
        info!(booking_id = %id, from = %current.status, to = %booking.status, "Booking status changed");
    }

    Ok(Json(
        json!({ "message": "Booking updated.", "booking": booking }),
    ))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    BookingRepository::new(state.pool())
        .delete(LandscapeBookingId::new(id))
        .await?;

    Ok(Json(json!({ "message": "Booking deleted." })))
}
