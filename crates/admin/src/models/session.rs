//! The admin identity kept in the session cookie's server-side record.

use serde::{Deserialize, Serialize};

use petal_core::{AdminRole, AdminUserId, Email};

use super::admin_user::AdminUser;

/// Snapshot of the logged-in admin taken at login.
///
/// Role changes made after login take effect on the next login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAdmin {
    pub id: AdminUserId,
    pub email: Email,
    pub name: String,
    pub role: AdminRole,
}

impl From<&AdminUser> for CurrentAdmin {
    fn from(user: &AdminUser) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
        }
    }
}

pub mod keys {
    pub const CURRENT_ADMIN: &str = "admin";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn test_snapshot_from_user() {
        let user = AdminUser {
            id: AdminUserId::new(7),
            email: Email::parse("Ops@Example.com").unwrap(),
            name: "Ops".to_string(),
            role: AdminRole::Viewer,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let current = CurrentAdmin::from(&user);
        assert_eq!(current.id, user.id);
        assert_eq!(current.email.as_str(), "ops@example.com");
        assert!(!current.role.can_write());

        let stored = serde_json::to_value(&current).unwrap();
        let restored: CurrentAdmin = serde_json::from_value(stored).unwrap();
        assert_eq!(restored, current);
    }
}
