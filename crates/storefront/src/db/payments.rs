//! Payment repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use petal_core::{OrderId, PaymentId, PaymentMethod, PaymentStatus};

use super::RepositoryError;
use crate::models::Payment;

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: i32,
    order_id: i32,
    amount: Decimal,
    method: PaymentMethod,
    status: PaymentStatus,
    transaction_id: Option<String>,
    refund_of: Option<i32>,
    notes: Option<String>,
    processed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PaymentRow> for Payment {
    fn from(row: PaymentRow) -> Self {
        Self {
            id: PaymentId::new(row.id),
            order_id: OrderId::new(row.order_id),
            amount: row.amount,
            method: row.method,
            status: row.status,
            transaction_id: row.transaction_id,
            refund_of: row.refund_of.map(PaymentId::new),
            notes: row.notes,
            processed_at: row.processed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const PAYMENT_COLUMNS: &str = "id, order_id, amount, method, status, transaction_id, refund_of, \
     notes, processed_at, created_at, updated_at";

/// Fields of a new payment row.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub order_id: OrderId,
    /// Negative for refunds.
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub refund_of: Option<PaymentId>,
    pub notes: Option<String>,
}

/// Completed money in and out of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaymentSums {
    /// Sum of completed non-refund payments.
    pub captured: Decimal,
    /// Absolute sum of completed refunds.
    pub refunded: Decimal,
}

/// Repository for payment reads.
pub struct PaymentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a payment by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: PaymentId) -> Result<Option<Payment>, RepositoryError> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1");
        let row = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// List the payments of an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_order(&self, order_id: OrderId) -> Result<Vec<Payment>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        list_for_order(&mut conn, order_id).await
    }
}

/// List the payments of an order, oldest first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_for_order(
    conn: &mut PgConnection,
    order_id: OrderId,
) -> Result<Vec<Payment>, RepositoryError> {
    let sql =
        format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE order_id = $1 ORDER BY created_at, id");
    let rows = sqlx::query_as::<_, PaymentRow>(&sql)
        .bind(order_id)
        .fetch_all(conn)
        .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// Lock a payment row for the rest of the transaction.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the payment does not exist.
pub async fn lock(conn: &mut PgConnection, id: PaymentId) -> Result<Payment, RepositoryError> {
    let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1 FOR UPDATE");
    let row = sqlx::query_as::<_, PaymentRow>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or(RepositoryError::NotFound)?;

    Ok(row.into())
}

/// Insert a payment row. Completed payments get `processed_at = NOW()`.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert(conn: &mut PgConnection, payment: &NewPayment) -> Result<Payment, RepositoryError> {
    let sql = format!(
        "INSERT INTO payments (order_id, amount, method, status, transaction_id, refund_of, notes, \
             processed_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, \
             CASE WHEN $4 = 'completed'::payment_status THEN NOW() END) \
         RETURNING {PAYMENT_COLUMNS}"
    );
    let row = sqlx::query_as::<_, PaymentRow>(&sql)
        .bind(payment.order_id)
        .bind(payment.amount)
        .bind(payment.method)
        .bind(payment.status)
        .bind(payment.transaction_id.as_deref())
        .bind(payment.refund_of)
        .bind(payment.notes.as_deref())
        .fetch_one(conn)
        .await?;

    Ok(row.into())
}

/// Change a payment's status, stamping `processed_at` on completion.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the payment does not exist.
pub async fn set_status(
    conn: &mut PgConnection,
    id: PaymentId,
    status: PaymentStatus,
    transaction_id: Option<&str>,
) -> Result<Payment, RepositoryError> {
    let sql = format!(
        "UPDATE payments SET status = $2, \
             transaction_id = COALESCE($3, transaction_id), \
             processed_at = CASE WHEN $2 = 'completed'::payment_status THEN NOW() \
                                 ELSE processed_at END \
         WHERE id = $1 RETURNING {PAYMENT_COLUMNS}"
    );
    let row = sqlx::query_as::<_, PaymentRow>(&sql)
        .bind(id)
        .bind(status)
        .bind(transaction_id)
        .fetch_optional(conn)
        .await?
        .ok_or(RepositoryError::NotFound)?;

    Ok(row.into())
}

/// Absolute sum of completed refunds issued against a payment.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn refunded_amount(
    conn: &mut PgConnection,
    payment_id: PaymentId,
) -> Result<Decimal, RepositoryError> {
    let sum: Decimal = sqlx::query_scalar(
        r"
        SELECT COALESCE(-SUM(amount), 0) FROM payments
        WHERE refund_of = $1 AND status = 'completed'
        ",
    )
    .bind(payment_id)
    .fetch_one(conn)
    .await?;

    Ok(sum)
}

/// Completed captured and refunded sums for an order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn sums_for_order(
    conn: &mut PgConnection,
    order_id: OrderId,
) -> Result<PaymentSums, RepositoryError> {
    let (captured, refunded): (Decimal, Decimal) = sqlx::query_as(
        r"
        SELECT
            COALESCE(SUM(amount) FILTER (WHERE refund_of IS NULL), 0),
            COALESCE(-SUM(amount) FILTER (WHERE refund_of IS NOT NULL), 0)
        FROM payments
        WHERE order_id = $1 AND status IN ('completed', 'refunded')
        ",
    )
    .bind(order_id)
    .fetch_one(conn)
    .await?;

    Ok(PaymentSums { captured, refunded })
}
