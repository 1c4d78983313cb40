//! Cart route handlers.
//!
//! Every handler resolves the cart through [`CurrentCart`]: the customer's
//! cart when logged in, the session's guest cart otherwise.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use validator::Validate;

use petal_core::{CartItemId, ProductAttributeId, ProductId};

use crate::error::{Result, add_breadcrumb};
use crate::extract::ValidatedJson;
use crate::middleware::CurrentCart;
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    pub product_attribute_id: Option<ProductAttributeId>,
    #[validate(range(min = 1, max = 99))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateItemRequest {
    #[validate(range(min = 1, max = 99))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ApplyDiscountRequest {
    #[validate(length(min = 1, max = 50))]
    pub code: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Show the cart, creating an empty one on first visit.
#[instrument(skip(state, owner))]
pub async fn show(
    State(state): State<AppState>,
    CurrentCart(owner): CurrentCart,
) -> Result<impl IntoResponse> {
    let cart = state.carts().view(owner).await?;
    Ok(Json(json!({ "cart": cart })))
}

/// Add a product (or variant) to the cart.
#[instrument(skip(state, owner, req), fields(product_id = %req.product_id))]
pub async fn add_item(
    State(state): State<AppState>,
    CurrentCart(owner): CurrentCart,
    ValidatedJson(req): ValidatedJson<AddItemRequest>,
) -> Result<impl IntoResponse> {
    let cart = state
        .carts()
        .add_item(owner, req.product_id, req.product_attribute_id, req.quantity)
        .await?;

    add_breadcrumb("cart", "Item added", None);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Item added to cart.", "cart": cart })),
    ))
}

/// Change the quantity of a line.
#[instrument(skip(state, owner, req))]
pub async fn update_item(
    State(state): State<AppState>,
    CurrentCart(owner): CurrentCart,
    Path(item_id): Path<i32>,
    ValidatedJson(req): ValidatedJson<UpdateItemRequest>,
) -> Result<impl IntoResponse> {
    let cart = state
        .carts()
        .update_item(owner, CartItemId::new(item_id), req.quantity)
        .await?;

    Ok(Json(json!({ "message": "Cart updated.", "cart": cart })))
}

/// Remove a line.
#[instrument(skip(state, owner))]
pub async fn remove_item(
    State(state): State<AppState>,
    CurrentCart(owner): CurrentCart,
    Path(item_id): Path<i32>,
) -> Result<impl IntoResponse> {
    let cart = state
        .carts()
        .remove_item(owner, CartItemId::new(item_id))
        .await?;

    Ok(Json(json!({ "message": "Item removed from cart.", "cart": cart })))
}

/// Empty the cart and drop its discount.
#[instrument(skip(state, owner))]
pub async fn clear(
    State(state): State<AppState>,
    CurrentCart(owner): CurrentCart,
) -> Result<impl IntoResponse> {
    let cart = state.carts().clear(owner).await?;
    Ok(Json(json!({ "message": "Cart cleared.", "cart": cart })))
}

/// Apply a discount code.
#[instrument(skip(state, owner, req))]
pub async fn apply_discount(
    State(state): State<AppState>,
    CurrentCart(owner): CurrentCart,
    ValidatedJson(req): ValidatedJson<ApplyDiscountRequest>,
) -> Result<impl IntoResponse> {
    let cart = state.carts().apply_discount(owner, &req.code).await?;
    Ok(Json(json!({ "message": "Discount applied.", "cart": cart })))
}

/// Remove the applied discount code.
#[instrument(skip(state, owner))]
pub async fn remove_discount(
    State(state): State<AppState>,
    CurrentCart(owner): CurrentCart,
) -> Result<impl IntoResponse> {
    let cart = state.carts().remove_discount(owner).await?;
    Ok(Json(json!({ "message": "Discount removed.", "cart": cart })))
}
