//! Discount repository.
//!
//! Redemption runs inside a caller-owned transaction: the free functions
//! taking a `PgConnection` are meant to be called with `&mut *tx`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use petal_core::{CustomerId, DiscountId, DiscountKind, OrderId};

use super::RepositoryError;
use crate::models::Discount;

#[derive(Debug, sqlx::FromRow)]
pub struct DiscountRow {
    id: i32,
    code: String,
    description: Option<String>,
    kind: DiscountKind,
    value: Decimal,
    max_discount_amount: Option<Decimal>,
    min_order_amount: Option<Decimal>,
    starts_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
    usage_limit: Option<i32>,
    usage_limit_per_customer: Option<i32>,
    used_count: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DiscountRow> for Discount {
    fn from(row: DiscountRow) -> Self {
        Self {
            id: DiscountId::new(row.id),
            code: row.code,
            description: row.description,
            kind: row.kind,
            value: row.value,
            max_discount_amount: row.max_discount_amount,
            min_order_amount: row.min_order_amount,
            starts_at: row.starts_at,
            expires_at: row.expires_at,
            usage_limit: row.usage_limit,
            usage_limit_per_customer: row.usage_limit_per_customer,
            used_count: row.used_count,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub const DISCOUNT_COLUMNS: &str = "id, code, description, kind, value, \
     max_discount_amount, min_order_amount, starts_at, expires_at, usage_limit, \
     usage_limit_per_customer, used_count, is_active, created_at, updated_at";

/// Repository for discount reads outside a transaction.
pub struct DiscountRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DiscountRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a discount by its (normalized, upper-case) code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_code(&self, code: &str) -> Result<Option<Discount>, RepositoryError> {
        let sql = format!("SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE code = $1");
        let row = sqlx::query_as::<_, DiscountRow>(&sql)
            .bind(code)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Get a discount by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: DiscountId) -> Result<Option<Discount>, RepositoryError> {
        let sql = format!("SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE id = $1");
        let row = sqlx::query_as::<_, DiscountRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// How many times a customer has redeemed a discount.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn customer_usage_count(
        &self,
        discount_id: DiscountId,
        customer_id: CustomerId,
    ) -> Result<i64, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        customer_usage_count(&mut conn, discount_id, customer_id).await
    }
}

/// Load a discount by id and lock its row until the transaction ends.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_by_id(
    conn: &mut PgConnection,
    id: DiscountId,
) -> Result<Option<Discount>, RepositoryError> {
    let sql = format!("SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE id = $1 FOR UPDATE");
    let row = sqlx::query_as::<_, DiscountRow>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;

    Ok(row.map(Into::into))
}

/// Load a discount by id without locking it.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_by_id(
    conn: &mut PgConnection,
    id: DiscountId,
) -> Result<Option<Discount>, RepositoryError> {
    let sql = format!("SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE id = $1");
    let row = sqlx::query_as::<_, DiscountRow>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;

    Ok(row.map(Into::into))
}

/// How many times a customer has redeemed a discount.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn customer_usage_count(
    conn: &mut PgConnection,
    discount_id: DiscountId,
    customer_id: CustomerId,
) -> Result<i64, RepositoryError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM discount_usages WHERE discount_id = $1 AND customer_id = $2",
    )
    .bind(discount_id)
    .bind(customer_id)
    .fetch_one(conn)
    .await?;

    Ok(count)
}

/// Record a redemption and bump the global counter.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if either statement fails.
pub async fn record_usage(
    conn: &mut PgConnection,
    discount_id: DiscountId,
    customer_id: CustomerId,
    order_id: OrderId,
    amount: Decimal,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO discount_usages (discount_id, customer_id, order_id, amount)
        VALUES ($1, $2, $3, $4)
        ",
    )
    .bind(discount_id)
    .bind(customer_id)
    .bind(order_id)
    .bind(amount)
    .execute(&mut *conn)
    .await?;

    sqlx::query("UPDATE discounts SET used_count = used_count + 1 WHERE id = $1")
        .bind(discount_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}
