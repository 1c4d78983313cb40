//! Event model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use petal_core::{EventId, Locale};

/// A public event (workshop, exhibition, ...).
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub id: EventId,
    pub title_en: String,
    pub title_ar: Option<String>,
    pub description_en: Option<String>,
    pub description_ar: Option<String>,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
    pub capacity: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    #[must_use]
    pub fn title(&self, locale: Locale) -> &str {
        locale.pick(&self.title_en, self.title_ar.as_deref())
    }

    #[must_use]
    pub fn description(&self, locale: Locale) -> Option<&str> {
        self.description_en
            .as_deref()
            .map(|en| locale.pick(en, self.description_ar.as_deref()))
    }

    /// Whether the event has not finished yet.
    #[must_use]
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.ends_at.unwrap_or(self.starts_at) >= now
    }
}
