//! Cart models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use petal_core::{
    CartId, CartItemId, CustomerId, DiscountId, ProductAttributeId, ProductId, Totals,
};

/// A shopping cart. Totals are persisted and recomputed after every change.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub id: CartId,
    pub customer_id: Option<CustomerId>,
    #[serde(skip_serializing)]
    pub session_token: Option<Uuid>,
    pub discount_id: Option<DiscountId>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    #[must_use]
    pub const fn totals(&self) -> Totals {
        Totals {
            subtotal: self.subtotal,
            tax: self.tax,
            shipping: self.shipping,
            discount: self.discount_amount,
            total: self.total,
        }
    }
}

/// A cart line, with product display fields joined in.
#[derive(Debug, Clone, Serialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub product_attribute_id: Option<ProductAttributeId>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total: Decimal,
    pub product_name: String,
    pub product_name_ar: Option<String>,
    pub product_slug: String,
    pub image_url: Option<String>,
    pub color_name: Option<String>,
    pub size_name: Option<String>,
}

/// A cart with its lines and applied discount code.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    #[serde(flatten)]
    pub cart: Cart,
    pub discount_code: Option<String>,
    pub items: Vec<CartItem>,
    pub item_count: i64,
}

impl CartView {
    #[must_use]
    pub fn new(cart: Cart, discount_code: Option<String>, items: Vec<CartItem>) -> Self {
        let item_count = items.iter().map(|i| i64::from(i.quantity)).sum();
        Self {
            cart,
            discount_code,
            items,
            item_count,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
