//! Payment records and refunds.
//!
//! Payments are tracked, not captured: the admin service moves them through
//! their lifecycle. After every change the order's `payment_status` is
//! derived again from the completed records.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use thiserror::Error;
use tracing::{info, instrument};

use petal_core::pricing::round_money;
use petal_core::{
    OrderId, OrderPaymentStatus, PaymentId, PaymentMethod, PaymentStatus, TransitionError,
};

use crate::db::payments::{self, NewPayment};
use crate::db::{PaymentRepository, RepositoryError, orders};
use crate::models::Payment;

/// Errors from payment operations.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment not found")]
    NotFound,

    #[error("order not found")]
    OrderNotFound,

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("amount must be greater than zero")]
    InvalidAmount,

    #[error("only completed payments can be refunded")]
    NotRefundable,

    #[error("refund exceeds the refundable amount of {remaining}")]
    ExceedsRefundable { remaining: Decimal },

    #[error("use the refund operation to refund a payment")]
    RefundViaStatus,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for PaymentError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(err.into())
    }
}

/// A payment recorded by staff.
#[derive(Debug, Clone)]
pub struct PaymentInput {
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub notes: Option<String>,
}

/// Payment service.
pub struct PaymentService<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a payment against an order.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::OrderNotFound` for unknown orders,
    /// `PaymentError::InvalidAmount` for non-positive amounts and
    /// `PaymentError::RefundViaStatus` when the status is `refunded`.
    #[instrument(skip(self, input), fields(amount = %input.amount, status = %input.status))]
    pub async fn record(&self, order_id: OrderId, input: PaymentInput) -> Result<Payment, PaymentError> {
        let amount = round_money(input.amount);
        if amount <= Decimal::ZERO {
            return Err(PaymentError::InvalidAmount);
        }
        if input.status == PaymentStatus::Refunded {
            return Err(PaymentError::RefundViaStatus);
        }

        let mut tx = self.pool.begin().await?;
        orders::lock(&mut *tx, order_id)
            .await
            .map_err(not_found_as(PaymentError::OrderNotFound))?;

        let payment = payments::insert(
            &mut *tx,
            &NewPayment {
                order_id,
                amount,
                method: input.method,
                status: input.status,
                transaction_id: input.transaction_id,
                refund_of: None,
                notes: input.notes,
            },
        )
        .await?;

        refresh_order_payment_status(&mut *tx, order_id).await?;
        tx.commit().await?;

        info!(payment_id = %payment.id, order_id = %order_id, "Payment recorded");
        Ok(payment)
    }

    /// Move a payment along its lifecycle.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Transition` for moves the lifecycle forbids and
    /// `PaymentError::RefundViaStatus` for `refunded`.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: PaymentId,
        status: PaymentStatus,
        transaction_id: Option<&str>,
    ) -> Result<Payment, PaymentError> {
        if status == PaymentStatus::Refunded {
            return Err(PaymentError::RefundViaStatus);
        }

        let current = PaymentRepository::new(self.pool)
            .get(id)
            .await?
            .ok_or(PaymentError::NotFound)?;

        let mut tx = self.pool.begin().await?;
        orders::lock(&mut *tx, current.order_id)
            .await
            .map_err(not_found_as(PaymentError::OrderNotFound))?;
        let current = payments::lock(&mut *tx, id)
            .await
            .map_err(not_found_as(PaymentError::NotFound))?;

        current.status.transition_to(status)?;
        let payment = payments::set_status(&mut *tx, id, status, transaction_id).await?;

        refresh_order_payment_status(&mut *tx, payment.order_id).await?;
        tx.commit().await?;

        info!(payment_id = %id, from = %current.status, to = %status, "Payment status changed");
        Ok(payment)
    }

    /// Refund a completed payment, fully or partially.
    ///
    /// Creates a completed negative-amount payment pointing at the original.
    /// When the refunds reach the original amount the original becomes
    /// `refunded`. `amount` defaults to everything still refundable.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::NotRefundable` unless the payment is a
    /// completed non-refund record, and `PaymentError::ExceedsRefundable`
    /// when `amount` is larger than what remains.
    #[instrument(skip(self, reason))]
    pub async fn refund(
        &self,
        id: PaymentId,
        amount: Option<Decimal>,
        reason: Option<String>,
    ) -> Result<Payment, PaymentError> {
        let original = PaymentRepository::new(self.pool)
            .get(id)
            .await?
            .ok_or(PaymentError::NotFound)?;

        let mut tx = self.pool.begin().await?;
        orders::lock(&mut *tx, original.order_id)
            .await
            .map_err(not_found_as(PaymentError::OrderNotFound))?;
        let original = payments::lock(&mut *tx, id)
            .await
            .map_err(not_found_as(PaymentError::NotFound))?;

        if original.is_refund() || original.status != PaymentStatus::Completed {
            return Err(PaymentError::NotRefundable);
        }

        let already = payments::refunded_amount(&mut *tx, id).await?;
        let amount = refund_amount(original.amount, already, amount)?;

        let refund = payments::insert(
            &mut *tx,
            &NewPayment {
                order_id: original.order_id,
                amount: -amount,
                method: original.method,
                status: PaymentStatus::Completed,
                transaction_id: None,
                refund_of: Some(id),
                notes: reason,
            },
        )
        .await?;

        if already + amount >= original.amount {
            original.status.transition_to(PaymentStatus::Refunded)?;
            payments::set_status(&mut *tx, id, PaymentStatus::Refunded, None).await?;
        }

        refresh_order_payment_status(&mut *tx, original.order_id).await?;
        tx.commit().await?;

        info!(payment_id = %id, refund_id = %refund.id, amount = %amount, "Payment refunded");
        Ok(refund)
    }
}

/// Validate a refund against what remains refundable.
fn refund_amount(
    original: Decimal,
    already_refunded: Decimal,
    requested: Option<Decimal>,
) -> Result<Decimal, PaymentError> {
    let remaining = (original - already_refunded).max(Decimal::ZERO);
    let amount = round_money(requested.unwrap_or(remaining));

    if amount <= Decimal::ZERO {
        return Err(if remaining.is_zero() {
            PaymentError::NotRefundable
        } else {
            PaymentError::InvalidAmount
        });
    }
    if amount > remaining {
        return Err(PaymentError::ExceedsRefundable { remaining });
    }
    Ok(amount)
}

/// Derive and store the order's payment status from its completed payments.
///
/// # Errors
///
/// Returns `RepositoryError` if the database fails.
pub async fn refresh_order_payment_status(
    conn: &mut PgConnection,
    order_id: OrderId,
) -> Result<OrderPaymentStatus, RepositoryError> {
    let order = orders::get(&mut *conn, order_id)
        .await?
        .ok_or(RepositoryError::NotFound)?;
    let sums = payments::sums_for_order(&mut *conn, order_id).await?;

    let status = OrderPaymentStatus::derive(order.total, sums.captured, sums.refunded);
    if status != order.payment_status {
        orders::set_payment_status(conn, order_id, status).await?;
    }
    Ok(status)
}

fn not_found_as(replacement: PaymentError) -> impl FnOnce(RepositoryError) -> PaymentError {
    move |err| match err {
        RepositoryError::NotFound => replacement,
        other => PaymentError::Repository(other),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_refund_defaults_to_remaining() {
        assert_eq!(
            refund_amount(dec("100.00"), dec("30.00"), None).unwrap(),
            dec("70.00")
        );
    }

    #[test]
    fn test_partial_refund_within_remaining() {
        assert_eq!(
            refund_amount(dec("100.00"), Decimal::ZERO, Some(dec("25.005"))).unwrap(),
            dec("25.01")
        );
    }

    #[test]
    fn test_refund_cannot_exceed_remaining() {
        let err = refund_amount(dec("100.00"), dec("80.00"), Some(dec("20.01"))).unwrap_err();
        match err {
            PaymentError::ExceedsRefundable { remaining } => assert_eq!(remaining, dec("20.00")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_fully_refunded_payment_is_not_refundable() {
        assert!(matches!(
            refund_amount(dec("100.00"), dec("100.00"), None),
            Err(PaymentError::NotRefundable)
        ));
        assert!(matches!(
            refund_amount(dec("100.00"), Decimal::ZERO, Some(dec("-5"))),
            Err(PaymentError::InvalidAmount)
        ));
    }
}
