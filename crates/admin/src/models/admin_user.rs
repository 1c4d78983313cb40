//! Admin user domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use petal_core::{AdminUserId, Email};

// Re-export AdminRole from core for convenience
pub use petal_core::AdminRole;

/// An admin user (domain type). The password hash never leaves the
/// repository.
#[derive(Debug, Clone, Serialize)]
pub struct AdminUser {
    pub id: AdminUserId,
    pub email: Email,
    pub name: String,
    pub role: AdminRole,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
