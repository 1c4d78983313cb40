//! Customer and address models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use petal_core::{AddressId, CustomerId, Email, Phone};

/// A storefront customer, identified by phone number.
#[derive(Debug, Clone, Serialize)]
pub struct Customer {
    pub id: CustomerId,
    pub phone: Phone,
    pub name: String,
    pub email: Option<Email>,
    pub phone_verified_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A saved shipping address.
#[derive(Debug, Clone, Serialize)]
pub struct Address {
    pub id: AddressId,
    pub customer_id: CustomerId,
    pub label: Option<String>,
    pub recipient_name: String,
    pub phone: String,
    pub street: String,
    pub building: Option<String>,
    pub area: Option<String>,
    pub city: String,
    pub postal_code: Option<String>,
    pub notes: Option<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Address {
    /// Single-line address: building, street, area, city and postal code,
    /// skipping empty parts.
    #[must_use]
    pub fn full_address(&self) -> String {
        join_address_parts([
            self.building.as_deref(),
            Some(self.street.as_str()),
            self.area.as_deref(),
            Some(self.city.as_str()),
            self.postal_code.as_deref(),
        ])
    }
}

/// Join the non-blank parts with `", "`.
pub(crate) fn join_address_parts<'a>(parts: impl IntoIterator<Item = Option<&'a str>>) -> String {
    parts
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_address_skips_blank_parts() {
        let now = Utc::now();
        let address = Address {
            id: AddressId::new(1),
            customer_id: CustomerId::new(1),
            label: Some("Home".to_string()),
            recipient_name: "Sara".to_string(),
            phone: "+966501234567".to_string(),
            street: "King Fahd Rd".to_string(),
            building: Some("12".to_string()),
            area: Some("  ".to_string()),
            city: "Riyadh".to_string(),
            postal_code: None,
            notes: None,
            is_default: true,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(address.full_address(), "12, King Fahd Rd, Riyadh");
    }
}
