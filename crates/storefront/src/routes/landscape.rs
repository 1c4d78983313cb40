//! Landscaping services and booking requests.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use validator::Validate;

use petal_core::{LandscapeService, Phone};

use super::resources::LandscapeServiceResource;
use crate::db::BookingRepository;
use crate::db::bookings::NewBooking;
use crate::error::{AppError, Result};
use crate::extract::{Lang, ValidatedJson};
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct BookingRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: String,
    #[validate(length(min = 6, max = 24))]
    pub phone: String,
    #[validate(email)]
    pub email: Option<String>,
    pub service_type: LandscapeService,
    #[validate(length(min = 5, max = 500))]
    pub address: String,
    pub preferred_date: NaiveDate,
    pub area_sqm: Option<Decimal>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// The bookable services with localized labels.
#[instrument]
pub async fn services(Lang(locale): Lang) -> impl IntoResponse {
    let data: Vec<_> = LandscapeService::ALL
        .iter()
        .map(|s| LandscapeServiceResource::new(*s, locale))
        .collect();
    Json(json!({ "data": data }))
}

/// Request a landscaping visit. Guests may book; logged-in customers get
/// the booking attached to their account.
#[instrument(skip(state, customer, req), fields(service = %req.service_type))]
pub async fn create_booking(
    State(state): State<AppState>,
    OptionalAuth(customer): OptionalAuth,
    ValidatedJson(req): ValidatedJson<BookingRequest>,
) -> Result<impl IntoResponse> {
    if req.preferred_date < Utc::now().date_naive() {
        return Err(AppError::field(
            "preferred_date",
            "The preferred date must be today or later.",
        ));
    }
    if req.area_sqm.is_some_and(|a| a <= Decimal::ZERO) {
        return Err(AppError::field("area_sqm", "The area must be greater than zero."));
    }

    let phone = Phone::parse_with_country(
        &req.phone,
        state.config().otp.default_country_code.as_deref(),
    )
    .map_err(|e| AppError::field("phone", e.to_string()))?;

    let booking = BookingRepository::new(state.pool())
        .create(&NewBooking {
            customer_id: customer.map(|c| c.id),
            name: req.name.trim().to_owned(),
            phone: phone.as_str().to_owned(),
            email: req.email.filter(|e| !e.trim().is_empty()),
            service_type: req.service_type,
            address: req.address,
            preferred_date: req.preferred_date,
            area_sqm: req.area_sqm,
            notes: req.notes,
        })
        .await?;

    info!(booking_id = %booking.id, "Landscape booking requested");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Your booking request has been received. We will contact you shortly.",
            "booking": booking,
        })),
    ))
}

/// The logged-in customer's bookings.
#[instrument(skip(state, customer), fields(customer_id = %customer.id))]
pub async fn my_bookings(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
) -> Result<impl IntoResponse> {
    let bookings = BookingRepository::new(state.pool())
        .list_for_customer(customer.id)
        .await?;
    Ok(Json(json!({ "data": bookings })))
}
