//! Customer profile, address book and order history.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;
use tracing::instrument;
use validator::Validate;

use petal_core::{AddressId, Email, OrderId};

use super::catalog::PageQuery;
use crate::db::customers::AddressInput;
use crate::db::{AddressRepository, CustomerRepository, OrderRepository, Page};
use crate::error::{AppError, Result};
use crate::extract::ValidatedJson;
use crate::middleware::{RequireAuth, session_error, set_current_customer};
use crate::models::CurrentCustomer;
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddressRequest {
    #[validate(length(max = 50))]
    pub label: Option<String>,
    #[validate(length(min = 2, max = 100))]
    pub recipient_name: String,
    #[validate(length(min = 6, max = 24))]
    pub phone: String,
    #[validate(length(min = 2, max = 255))]
    pub street: String,
    #[validate(length(max = 100))]
    pub building: Option<String>,
    #[validate(length(max = 100))]
    pub area: Option<String>,
    #[validate(length(min = 2, max = 100))]
    pub city: String,
    #[validate(length(max = 20))]
    pub postal_code: Option<String>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

impl From<AddressRequest> for AddressInput {
    fn from(req: AddressRequest) -> Self {
        Self {
            label: req.label,
            recipient_name: req.recipient_name,
            phone: req.phone,
            street: req.street,
            building: req.building,
            area: req.area,
            city: req.city,
            postal_code: req.postal_code,
            notes: req.notes,
            is_default: req.is_default,
        }
    }
}

// =============================================================================
// Profile
// =============================================================================

#[instrument(skip(state, customer), fields(customer_id = %customer.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
) -> Result<impl IntoResponse> {
    let customer = CustomerRepository::new(state.pool())
        .get_by_id(customer.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer not found.".to_string()))?;

    Ok(Json(json!({ "customer": customer })))
}

#[instrument(skip(state, session, customer, req), fields(customer_id = %customer.id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(customer): RequireAuth,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse> {
    let email = req
        .email
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .map(Email::parse)
        .transpose()
        .map_err(|e| AppError::field("email", e.to_string()))?;

    let updated = CustomerRepository::new(state.pool())
        .update_profile(customer.id, req.name.trim(), email.as_ref())
        .await?;

    // Keep the session's display name in step with the profile.
    let current = CurrentCustomer {
        name: updated.name.clone(),
        ..customer
    };
    set_current_customer(&session, &current)
        .await
        .map_err(session_error)?;

    Ok(Json(json!({ "message": "Profile updated.", "customer": updated })))
}

// =============================================================================
// Addresses
// =============================================================================

#[instrument(skip(state, customer), fields(customer_id = %customer.id))]
pub async fn addresses(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
) -> Result<impl IntoResponse> {
    let addresses = AddressRepository::new(state.pool())
        .list_for_customer(customer.id)
        .await?;
    Ok(Json(json!({ "data": addresses })))
}

#[instrument(skip(state, customer, req), fields(customer_id = %customer.id))]
pub async fn create_address(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    ValidatedJson(req): ValidatedJson<AddressRequest>,
) -> Result<impl IntoResponse> {
    let address = AddressRepository::new(state.pool())
        .create(customer.id, &req.into())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Address saved.", "address": address })),
    ))
}

#[instrument(skip(state, customer, req), fields(customer_id = %customer.id))]
pub async fn update_address(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<i32>,
    ValidatedJson(req): ValidatedJson<AddressRequest>,
) -> Result<impl IntoResponse> {
    let address = AddressRepository::new(state.pool())
        .update(AddressId::new(id), customer.id, &req.into())
        .await?;
    Ok(Json(json!({ "message": "Address updated.", "address": address })))
}

#[instrument(skip(state, customer), fields(customer_id = %customer.id))]
pub async fn delete_address(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    AddressRepository::new(state.pool())
        .delete(AddressId::new(id), customer.id)
        .await?;
    Ok(Json(json!({ "message": "Address deleted." })))
}

// =============================================================================
// Orders
// =============================================================================

#[instrument(skip(state, customer, query), fields(customer_id = %customer.id))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let orders = OrderRepository::new(state.pool())
        .list_for_customer(customer.id, Page::new(query.page, query.per_page))
        .await?;
    Ok(Json(orders))
}

#[instrument(skip(state, customer), fields(customer_id = %customer.id))]
pub async fn order(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let order = OrderRepository::new(state.pool())
        .get_detail_for_customer(OrderId::new(id), customer.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found.".to_string()))?;
    Ok(Json(json!({ "order": order })))
}
