//! Landscaping booking repository.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use petal_core::{BookingStatus, CustomerId, LandscapeBookingId, LandscapeService};

use super::{Page, Paginated, RepositoryError};
use crate::models::LandscapeBooking;

#[derive(Debug, sqlx::FromRow)]
struct BookingRow {
    id: i32,
    customer_id: Option<i32>,
    name: String,
    phone: String,
    email: Option<String>,
    service_type: LandscapeService,
    address: String,
    preferred_date: NaiveDate,
    area_sqm: Option<Decimal>,
    notes: Option<String>,
    status: BookingStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BookingRow> for LandscapeBooking {
    fn from(row: BookingRow) -> Self {
        Self {
            id: LandscapeBookingId::new(row.id),
            customer_id: row.customer_id.map(CustomerId::new),
            name: row.name,
            phone: row.phone,
            email: row.email,
            service_type: row.service_type,
            address: row.address,
            preferred_date: row.preferred_date,
            area_sqm: row.area_sqm,
            notes: row.notes,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const BOOKING_COLUMNS: &str = "id, customer_id, name, phone, email, service_type, address, \
     preferred_date, area_sqm, notes, status, created_at, updated_at";

/// Fields of a new booking request.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub customer_id: Option<CustomerId>,
    pub name: String,
    /// Normalized phone number.
    pub phone: String,
    pub email: Option<String>,
    pub service_type: LandscapeService,
    pub address: String,
    pub preferred_date: NaiveDate,
    pub area_sqm: Option<Decimal>,
    pub notes: Option<String>,
}

/// Repository for landscaping bookings.
pub struct BookingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BookingRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a booking request.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, booking: &NewBooking) -> Result<LandscapeBooking, RepositoryError> {
        let sql = format!(
            "INSERT INTO landscape_bookings (customer_id, name, phone, email, service_type, \
                 address, preferred_date, area_sqm, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {BOOKING_COLUMNS}"
        );
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(booking.customer_id)
            .bind(&booking.name)
            .bind(&booking.phone)
            .bind(booking.email.as_deref())
            .bind(booking.service_type)
            .bind(&booking.address)
            .bind(booking.preferred_date)
            .bind(booking.area_sqm)
            .bind(booking.notes.as_deref())
            .fetch_one(self.pool)
            .await?;

        Ok(row.into())
    }

    /// List a customer's bookings, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<LandscapeBooking>, RepositoryError> {
        let sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM landscape_bookings WHERE customer_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(customer_id)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// List all bookings, newest first, optionally by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        status: Option<BookingStatus>,
        page: Page,
    ) -> Result<Paginated<LandscapeBooking>, RepositoryError> {
        let where_sql = "($1::booking_status IS NULL OR status = $1)";
        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM landscape_bookings WHERE {where_sql}"
        ))
        .bind(status)
        .fetch_one(self.pool)
        .await?;

        let sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM landscape_bookings WHERE {where_sql} \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(status)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;

        Ok(Paginated::new(
            rows.into_iter().map(Into::into).collect(),
            page,
            total,
        ))
    }

    /// Get a booking by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        id: LandscapeBookingId,
    ) -> Result<Option<LandscapeBooking>, RepositoryError> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM landscape_bookings WHERE id = $1");
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Update status and notes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the booking does not exist.
    pub async fn update(
        &self,
        id: LandscapeBookingId,
        status: BookingStatus,
        notes: Option<&str>,
    ) -> Result<LandscapeBooking, RepositoryError> {
        let sql = format!(
            "UPDATE landscape_bookings SET status = $2, notes = COALESCE($3, notes) \
             WHERE id = $1 RETURNING {BOOKING_COLUMNS}"
        );
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(id)
            .bind(status)
            .bind(notes)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a booking.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the booking does not exist.
    pub async fn delete(&self, id: LandscapeBookingId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM landscape_bookings WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
