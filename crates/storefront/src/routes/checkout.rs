//! Checkout route handler.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use validator::Validate;

use petal_core::{AddressId, PaymentMethod};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::ValidatedJson;
use crate::middleware::RequireAuth;
use crate::services::{CheckoutRequest, ShippingAddress, ShippingTarget};
use crate::state::AppState;

/// Address typed in at checkout instead of a saved one.
#[derive(Debug, Deserialize, Validate)]
pub struct AddressBody {
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
}

impl From<AddressBody> for ShippingAddress {
    fn from(body: AddressBody) -> Self {
        Self {
            recipient_name: body.recipient_name,
            phone: body.phone,
            street: body.street,
            building: body.building,
            area: body.area,
            city: body.city,
            postal_code: body.postal_code,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutBody {
    pub address_id: Option<AddressId>,
    #[validate(nested)]
    pub address: Option<AddressBody>,
    pub payment_method: PaymentMethod,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
    pub delivery_date: Option<NaiveDate>,
}

impl CheckoutBody {
    /// A saved address wins over an inline one.
    fn into_request(self) -> Result<CheckoutRequest> {
        let shipping = match (self.address_id, self.address) {
            (Some(id), _) => ShippingTarget::Saved(id),
            (None, Some(address)) => ShippingTarget::Inline(address.into()),
            (None, None) => {
                return Err(AppError::field(
                    "address_id",
                    "A saved address or a shipping address is required.",
                ));
            }
        };

        Ok(CheckoutRequest {
            shipping,
            payment_method: self.payment_method,
            notes: self.notes.filter(|n| !n.trim().is_empty()),
            delivery_date: self.delivery_date,
        })
    }
}

/// Place an order from the logged-in customer's cart.
#[instrument(skip(state, customer, body), fields(customer_id = %customer.id))]
pub async fn place_order(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    ValidatedJson(body): ValidatedJson<CheckoutBody>,
) -> Result<impl IntoResponse> {
    let request = body.into_request()?;
    let order = state.checkout().place_order(customer.id, request).await?;

    info!(order_number = %order.order.order_number, total = %order.order.total, "Order placed");
    add_breadcrumb("checkout", "Order placed", None);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Order placed.", "order": order })),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn body(json: serde_json::Value) -> CheckoutBody {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_saved_address_wins() {
        let request = body(json!({
            "address_id": 4,
            "address": {"recipient_name": "Sara", "phone": "0501234567",
                        "street": "Olaya St", "city": "Riyadh"},
            "payment_method": "cash_on_delivery",
            "notes": "  ",
        }))
        .into_request()
        .unwrap();

        assert!(matches!(request.shipping, ShippingTarget::Saved(id) if id == AddressId::new(4)));
        assert_eq!(request.notes, None);
    }

    #[test]
    fn test_address_required() {
        let result = body(json!({"payment_method": "cash_on_delivery"})).into_request();
        assert!(matches!(result, Err(AppError::Validation(errors)) if errors.contains_key("address_id")));
    }

    #[test]
    fn test_inline_address_is_validated() {
        let checkout = body(json!({
            "address": {"recipient_name": "S", "phone": "0501234567",
                        "street": "Olaya St", "city": "Riyadh"},
            "payment_method": "cash_on_delivery",
        }));
        let errors = checkout.validate().unwrap_err();
        assert!(errors.errors().contains_key("address"));
    }
}
