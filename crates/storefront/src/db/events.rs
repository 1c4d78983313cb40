//! Event repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use petal_core::EventId;

use super::{Page, Paginated, RepositoryError};
use crate::models::Event;

#[derive(Debug, sqlx::FromRow)]
pub struct EventRow {
    id: i32,
    title_en: String,
    title_ar: Option<String>,
    description_en: Option<String>,
    description_ar: Option<String>,
    location: Option<String>,
    starts_at: DateTime<Utc>,
    ends_at: Option<DateTime<Utc>>,
    image_url: Option<String>,
    capacity: Option<i32>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Self {
            id: EventId::new(row.id),
            title_en: row.title_en,
            title_ar: row.title_ar,
            description_en: row.description_en,
            description_ar: row.description_ar,
            location: row.location,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            image_url: row.image_url,
            capacity: row.capacity,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub const EVENT_COLUMNS: &str = "id, title_en, title_ar, description_en, description_ar, location, \
     starts_at, ends_at, image_url, capacity, is_active, created_at, updated_at";

/// Repository for event reads.
pub struct EventRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> EventRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List active events. Upcoming events only unless `include_past`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(
        &self,
        include_past: bool,
        page: Page,
    ) -> Result<Paginated<Event>, RepositoryError> {
        let where_sql = "is_active AND ($1 OR COALESCE(ends_at, starts_at) >= NOW())";

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM events WHERE {where_sql}"))
            .bind(include_past)
            .fetch_one(self.pool)
            .await?;

        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE {where_sql} \
             ORDER BY starts_at, id LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, EventRow>(&sql)
            .bind(include_past)
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

    /// Get an event by ID regardless of its active flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: EventId) -> Result<Option<Event>, RepositoryError> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }
}
