//! Event administration.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use validator::Validate;

use petal_core::EventId;
use petal_storefront::db::events::{EVENT_COLUMNS, EventRow};

use super::{Page, Paginated, RepositoryError};
use crate::models::Event;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EventInput {
    #[validate(length(min = 1, max = 255))]
    pub title_en: String,
    #[validate(length(max = 255))]
    pub title_ar: Option<String>,
    pub description_en: Option<String>,
    pub description_ar: Option<String>,
    #[validate(length(max = 255))]
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    #[validate(url)]
    pub image_url: Option<String>,
    #[validate(range(min = 1))]
    pub capacity: Option<i32>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl EventInput {
    /// Cross-field rules. Returns the offending field and message.
    #[must_use]
    pub fn check(&self) -> Option<(&'static str, &'static str)> {
        match self.ends_at {
            Some(ends) if ends < self.starts_at => {
                Some(("ends_at", "The end must be after the start."))
            }
            _ => None,
        }
    }
}

/// Repository for event administration.
pub struct EventAdminRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> EventAdminRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List every event, latest start first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, page: Page) -> Result<Paginated<Event>, RepositoryError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events")
            .fetch_one(self.pool)
            .await?;

        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY starts_at DESC, id DESC \
             LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query_as::<_, EventRow>(&sql)
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

    /// Create an event.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &EventInput) -> Result<Event, RepositoryError> {
        let sql = format!(
            "INSERT INTO events (title_en, title_ar, description_en, description_ar, location, \
                 starts_at, ends_at, image_url, capacity, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {EVENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(&input.title_en)
            .bind(input.title_ar.as_deref())
            .bind(input.description_en.as_deref())
            .bind(input.description_ar.as_deref())
            .bind(input.location.as_deref())
            .bind(input.starts_at)
            .bind(input.ends_at)
            .bind(input.image_url.as_deref())
            .bind(input.capacity)
            .bind(input.is_active)
            .fetch_one(self.pool)
            .await?;

        Ok(row.into())
    }

    /// Replace an event's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for unknown ids.
    pub async fn update(&self, id: EventId, input: &EventInput) -> Result<Event, RepositoryError> {
        let sql = format!(
            "UPDATE events SET title_en = $2, title_ar = $3, description_en = $4, \
                 description_ar = $5, location = $6, starts_at = $7, ends_at = $8, \
                 image_url = $9, capacity = $10, is_active = $11 \
             WHERE id = $1 RETURNING {EVENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(id)
            .bind(&input.title_en)
            .bind(input.title_ar.as_deref())
            .bind(input.description_en.as_deref())
            .bind(input.description_ar.as_deref())
            .bind(input.location.as_deref())
            .bind(input.starts_at)
            .bind(input.ends_at)
            .bind(input.image_url.as_deref())
            .bind(input.capacity)
            .bind(input.is_active)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete an event.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for unknown ids.
    pub async fn delete(&self, id: EventId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_event_must_end_after_start() {
        let starts_at = Utc::now();
        let mut input = EventInput {
            title_en: "Bonsai workshop".to_string(),
            title_ar: None,
            description_en: None,
            description_ar: None,
            location: Some("Riyadh".to_string()),
            starts_at,
            ends_at: Some(starts_at - Duration::hours(1)),
            image_url: None,
            capacity: Some(20),
            is_active: true,
        };
        assert_eq!(input.check().map(|(f, _)| f), Some("ends_at"));

        input.ends_at = Some(starts_at + Duration::hours(2));
        assert!(input.check().is_none());
        assert!(input.validate().is_ok());
    }
}
