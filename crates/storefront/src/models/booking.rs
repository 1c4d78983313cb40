//! Landscaping booking model.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use petal_core::{BookingStatus, CustomerId, LandscapeBookingId, LandscapeService};

#[derive(Debug, Clone, Serialize)]
pub struct LandscapeBooking {
    pub id: LandscapeBookingId,
    pub customer_id: Option<CustomerId>,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub service_type: LandscapeService,
    pub address: String,
    pub preferred_date: NaiveDate,
    pub area_sqm: Option<Decimal>,
    pub notes: Option<String>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
