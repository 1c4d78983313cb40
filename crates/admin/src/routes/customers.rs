//! Customer administration.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use validator::Validate;

use petal_core::{CustomerId, Email};
use petal_storefront::extract::ValidatedJson;

use super::ListQuery;
use crate::db::{AddressRepository, CustomerRepository, OrderRepository, Page};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireWriter};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: Option<String>,
    /// Disabled customers cannot log in.
    pub is_active: Option<bool>,
}

fn customer_not_found() -> AppError {
    AppError::NotFound("Customer not found.".to_string())
}

/// Customers, newest first, searchable by name, phone or email.
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let customers = CustomerRepository::new(state.pool())
        .list(query.search(), query.page())
        .await?;
    Ok(Json(customers))
}

/// A customer with their address book and latest orders.
#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let id = CustomerId::new(id);
    let customer = CustomerRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(customer_not_found)?;

    let addresses = AddressRepository::new(state.pool())
        .list_for_customer(id)
        .await?;
    let orders = OrderRepository::new(state.pool())
        .list_for_customer(id, Page::default())
        .await?;

    Ok(Json(json!({
        "customer": customer,
        "addresses": addresses,
        "orders": orders,
    })))
}

#[instrument(skip(state, admin, req), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<i32>,
    ValidatedJson(req): ValidatedJson<UpdateCustomerRequest>,
) -> Result<impl IntoResponse> {
    let id = CustomerId::new(id);
    let email = req
        .email
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .map(Email::parse)
        .transpose()
        .map_err(|e| AppError::field("email", e.to_string()))?;

    let customers = CustomerRepository::new(state.pool());
    let mut customer = customers
        .update_profile(id, req.name.trim(), email.as_ref())
        .await?;

    if let Some(is_active) = req.is_active
        && is_active != customer.is_active
    {
        customers.set_active(id, is_active).await?;
        customer.is_active = is_active;
        info!(customer_id = %id, is_active, "Customer access changed");
    }

    Ok(Json(
        json!({ "message": "Customer updated.", "customer": customer }),
    ))
}

/// Delete a customer with their addresses, cart and orders.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    CustomerRepository::new(state.pool())
        .delete(CustomerId::new(id))
        .await?;

    Ok(Json(json!({ "message": "Customer deleted." })))
}
