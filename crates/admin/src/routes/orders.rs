//! Orders, their fulfilment status and their payments.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use validator::Validate;

use petal_core::{OrderId, OrderStatus, PaymentId, PaymentMethod, PaymentStatus};
use petal_storefront::extract::ValidatedJson;
use petal_storefront::services::payments::PaymentInput;

use super::ListQuery;
use crate::db::catalog::non_negative;
use crate::db::{OrderRepository, PaymentRepository};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireWriter};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecordPaymentRequest {
    #[validate(custom(function = "non_negative"))]
    pub amount: Decimal,
    pub method: PaymentMethod,
    #[serde(default)]
    pub status: PaymentStatus,
    #[validate(length(max = 255))]
    pub transaction_id: Option<String>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PaymentStatusRequest {
    pub status: PaymentStatus,
    #[validate(length(max = 255))]
    pub transaction_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct RefundRequest {
    /// Defaults to everything still refundable.
    #[validate(custom(function = "non_negative"))]
    pub amount: Option<Decimal>,
    #[validate(length(max = 1000))]
    pub reason: Option<String>,
}

fn order_not_found() -> AppError {
    AppError::NotFound("Order not found.".to_string())
}

// =============================================================================
// Orders
// =============================================================================

#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let orders = OrderRepository::new(state.pool())
        .list(query.status()?, query.page())
        .await?;
    Ok(Json(orders))
}

/// An order with its items and payments.
#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let detail = OrderRepository::new(state.pool())
        .get_detail(OrderId::new(id))
        .await?
        .ok_or_else(order_not_found)?;

    Ok(Json(json!({ "order": detail })))
}

/// Move an order along its lifecycle; cancelling restocks its items.
#[instrument(skip(state, admin), fields(admin_id = %admin.id, status = %req.status))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<i32>,
    Json(req): Json<OrderStatusRequest>,
) -> Result<impl IntoResponse> {
    let order = state
        .orders()
        .update_status(OrderId::new(id), req.status)
        .await?;

    Ok(Json(
        json!({ "message": "Order status updated.", "order": order }),
    ))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    state.orders().delete(OrderId::new(id)).await?;
    Ok(Json(json!({ "message": "Order deleted." })))
}

// =============================================================================
// Payments
// =============================================================================

#[instrument(skip(state, _admin))]
pub async fn payments(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let id = OrderId::new(id);
    let detail = OrderRepository::new(state.pool())
        .get_detail(id)
        .await?
        .ok_or_else(order_not_found)?;

    Ok(Json(json!({ "data": detail.payments })))
}

#[instrument(skip(state, admin, req), fields(admin_id = %admin.id, method = %req.method))]
pub async fn record_payment(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<i32>,
    ValidatedJson(req): ValidatedJson<RecordPaymentRequest>,
) -> Result<impl IntoResponse> {
    let payment = state
        .payments()
        .record(
            OrderId::new(id),
            PaymentInput {
                amount: req.amount,
                method: req.method,
                status: req.status,
                transaction_id: req.transaction_id,
                notes: req.notes,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Payment recorded.", "payment": payment })),
    ))
}

#[instrument(skip(state, admin, req), fields(admin_id = %admin.id, status = %req.status))]
pub async fn update_payment_status(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<i32>,
    ValidatedJson(req): ValidatedJson<PaymentStatusRequest>,
) -> Result<impl IntoResponse> {
    let payment = state
        .payments()
        .update_status(PaymentId::new(id), req.status, req.transaction_id.as_deref())
        .await?;

    Ok(Json(
        json!({ "message": "Payment status updated.", "payment": payment }),
    ))
}

/// Refund a completed payment. Responds with the refund record and the
/// original payment as it stands afterwards.
#[instrument(skip(state, admin, req), fields(admin_id = %admin.id))]
pub async fn refund_payment(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<i32>,
    ValidatedJson(req): ValidatedJson<RefundRequest>,
) -> Result<impl IntoResponse> {
    let id = PaymentId::new(id);
    let refund = state.payments().refund(id, req.amount, req.reason).await?;
    let payment = PaymentRepository::new(state.pool()).get(id).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Payment refunded.",
            "refund": refund,
            "payment": payment,
        })),
    ))
}
