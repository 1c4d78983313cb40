//! Discount code administration.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use validator::Validate;

use petal_core::discount::normalize_code;
use petal_core::{DiscountId, DiscountKind};
use petal_storefront::db::discounts::{DISCOUNT_COLUMNS, DiscountRow};

use super::catalog::non_negative;
use super::{Page, Paginated, RepositoryError, like_pattern};
use crate::models::Discount;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DiscountInput {
    #[validate(length(min = 1, max = 50))]
    pub code: String,
    #[validate(length(max = 255))]
    pub description: Option<String>,
    pub kind: DiscountKind,
    #[validate(custom(function = "non_negative"))]
    pub value: Decimal,
    #[validate(custom(function = "non_negative"))]
    pub max_discount_amount: Option<Decimal>,
    #[validate(custom(function = "non_negative"))]
    pub min_order_amount: Option<Decimal>,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    #[validate(range(min = 1))]
    pub usage_limit: Option<i32>,
    #[validate(range(min = 1))]
    pub usage_limit_per_customer: Option<i32>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl DiscountInput {
    /// Cross-field rules. Returns the offending field and message.
    #[must_use]
    pub fn check(&self) -> Option<(&'static str, &'static str)> {
        if self.kind == DiscountKind::Percentage && self.value > Decimal::ONE_HUNDRED {
            return Some(("value", "A percentage discount cannot exceed 100."));
        }
        if let (Some(starts), Some(expires)) = (self.starts_at, self.expires_at)
            && starts > expires
        {
            return Some(("expires_at", "The expiry must be after the start."));
        }
        None
    }
}

/// Repository for discount administration.
pub struct DiscountAdminRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DiscountAdminRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List discounts, newest first, optionally matching a code search.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        search: Option<&str>,
        page: Page,
    ) -> Result<Paginated<Discount>, RepositoryError> {
        let pattern = search.filter(|s| !s.trim().is_empty()).map(like_pattern);
        let where_sql = "($1::text IS NULL OR code ILIKE $1 OR description ILIKE $1)";

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM discounts WHERE {where_sql}"))
                .bind(pattern.as_deref())
                .fetch_one(self.pool)
                .await?;

        let sql = format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE {where_sql} \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, DiscountRow>(&sql)
            .bind(pattern.as_deref())
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

    /// Create a discount. The code is stored upper-case.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code exists.
    pub async fn create(&self, input: &DiscountInput) -> Result<Discount, RepositoryError> {
        let sql = format!(
            "INSERT INTO discounts (code, description, kind, value, max_discount_amount, \
                 min_order_amount, starts_at, expires_at, usage_limit, usage_limit_per_customer, \
                 is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {DISCOUNT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, DiscountRow>(&sql)
            .bind(normalize_code(&input.code))
            .bind(input.description.as_deref())
            .bind(input.kind)
            .bind(input.value)
            .bind(input.max_discount_amount)
            .bind(input.min_order_amount)
            .bind(input.starts_at)
            .bind(input.expires_at)
            .bind(input.usage_limit)
            .bind(input.usage_limit_per_customer)
            .bind(input.is_active)
            .fetch_one(self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "discount code"))?;

        Ok(row.into())
    }

    /// Replace a discount's fields. `used_count` is kept.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for unknown ids and
    /// `RepositoryError::Conflict` if the new code exists.
    pub async fn update(
        &self,
        id: DiscountId,
        input: &DiscountInput,
    ) -> Result<Discount, RepositoryError> {
        let sql = format!(
            "UPDATE discounts SET code = $2, description = $3, kind = $4, value = $5, \
                 max_discount_amount = $6, min_order_amount = $7, starts_at = $8, \
                 expires_at = $9, usage_limit = $10, usage_limit_per_customer = $11, \
                 is_active = $12 \
             WHERE id = $1 RETURNING {DISCOUNT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, DiscountRow>(&sql)
            .bind(id)
            .bind(normalize_code(&input.code))
            .bind(input.description.as_deref())
            .bind(input.kind)
            .bind(input.value)
            .bind(input.max_discount_amount)
            .bind(input.min_order_amount)
            .bind(input.starts_at)
            .bind(input.expires_at)
            .bind(input.usage_limit)
            .bind(input.usage_limit_per_customer)
            .bind(input.is_active)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "discount code"))?
            .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a discount and its usage records. Carts and orders keep their
    /// amounts but lose the reference.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for unknown ids.
    pub async fn delete(&self, id: DiscountId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM discounts WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "discount code"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input(kind: &str, value: &str) -> DiscountInput {
        serde_json::from_value(serde_json::json!({
            "code": "spring10",
            "kind": kind,
            "value": value,
        }))
        .unwrap()
    }

    #[test]
    fn test_percentage_capped_at_100() {
        assert_eq!(
            input("percentage", "120").check().map(|(f, _)| f),
            Some("value")
        );
        assert!(input("percentage", "100").check().is_none());
        assert!(input("fixed", "120").check().is_none());
    }

    #[test]
    fn test_usage_limit_must_be_positive() {
        let mut discount = input("fixed", "10");
        discount.usage_limit = Some(0);
        assert!(discount.validate().is_err());
        discount.usage_limit = Some(5);
        assert!(discount.validate().is_ok());
        assert!(discount.is_active);
    }
}
