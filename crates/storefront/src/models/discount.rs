//! Discount code model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use petal_core::{DiscountId, DiscountKind, DiscountRule};

#[derive(Debug, Clone, Serialize)]
pub struct Discount {
    pub id: DiscountId,
    pub code: String,
    pub description: Option<String>,
    pub kind: DiscountKind,
    pub value: Decimal,
    pub max_discount_amount: Option<Decimal>,
    pub min_order_amount: Option<Decimal>,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub usage_limit: Option<i32>,
    pub usage_limit_per_customer: Option<i32>,
    pub used_count: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Discount {
    /// The validation-relevant rules of this code.
    #[must_use]
    pub const fn rule(&self) -> DiscountRule {
        DiscountRule {
            kind: self.kind,
            value: self.value,
            max_discount_amount: self.max_discount_amount,
            min_order_amount: self.min_order_amount,
            starts_at: self.starts_at,
            expires_at: self.expires_at,
            usage_limit: self.usage_limit,
            usage_limit_per_customer: self.usage_limit_per_customer,
            used_count: self.used_count,
            is_active: self.is_active,
        }
    }
}
