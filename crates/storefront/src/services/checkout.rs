//! Checkout: turn a customer's cart into an order.
//!
//! Runs as one transaction. The cart row, every variant row and the discount
//! row are locked `FOR UPDATE` so concurrent checkouts cannot oversell stock
//! or redeem a code past its limits.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, instrument};

use petal_core::pricing::line_total;
use petal_core::{
    AddressId, CustomerId, DiscountError, PaymentMethod, PaymentStatus,
    PricingConfig, ProductId, Totals,
};

use crate::db::orders::{self, NewOrder, NewOrderItem};
use crate::db::payments::{self, NewPayment};
use crate::db::{AddressRepository, RepositoryError, carts, catalog, discounts};
use crate::models::OrderDetail;
use crate::models::customer::join_address_parts;

/// Errors from checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("your cart is empty")]
    EmptyCart,

    #[error("a product in your cart is no longer available")]
    ProductUnavailable { product_id: ProductId },

    #[error("only {available} of {product_name} left in stock")]
    InsufficientStock { product_name: String, available: i32 },

    #[error("address not found")]
    AddressNotFound,

    #[error("delivery date cannot be in the past")]
    DeliveryDateInPast,

    #[error(transparent)]
    Discount(#[from] DiscountError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(err.into())
    }
}

/// A shipping address typed in at checkout.
#[derive(Debug, Clone)]
pub struct ShippingAddress {
    pub recipient_name: String,
    pub phone: String,
    pub street: String,
    pub building: Option<String>,
    pub area: Option<String>,
    pub city: String,
    pub postal_code: Option<String>,
}

/// Where the order ships to.
#[derive(Debug, Clone)]
pub enum ShippingTarget {
    Saved(AddressId),
    Inline(ShippingAddress),
}

#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub shipping: ShippingTarget,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub delivery_date: Option<NaiveDate>,
}

/// Checkout service.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    pricing: PricingConfig,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, pricing: PricingConfig) -> Self {
        Self { pool, pricing }
    }

    /// Place an order from the customer's cart.
    ///
    /// Locks the cart, re-checks and decrements stock, redeems the discount,
    /// snapshots prices and the shipping address, creates a pending payment
    /// for the total and empties the cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart`, `ProductUnavailable`,
    /// `InsufficientStock`, `AddressNotFound` or `Discount` when the order
    /// cannot be placed; nothing is written in that case.
    #[instrument(skip(self, request), fields(payment_method = %request.payment_method))]
    pub async fn place_order(
        &self,
        customer_id: CustomerId,
        request: CheckoutRequest,
    ) -> Result<OrderDetail, CheckoutError> {
        let now = Utc::now();
        if request
            .delivery_date
            .is_some_and(|date| date < now.date_naive())
        {
            return Err(CheckoutError::DeliveryDateInPast);
        }

        let shipping = self.resolve_shipping(customer_id, &request.shipping).await?;

        let mut tx = self.pool.begin().await?;

        let cart = carts::find_by_customer(&mut *tx, customer_id)
            .await?
            .ok_or(CheckoutError::EmptyCart)?;
        let cart = carts::lock(&mut *tx, cart.id).await?;

        let mut lines = carts::list_pricing_lines(&mut *tx, cart.id).await?;
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        if let Some(inactive) = lines.iter().find(|l| !l.product_active) {
            return Err(CheckoutError::ProductUnavailable {
                product_id: inactive.product_id,
            });
        }

        let display: HashMap<_, _> = carts::list_items(&mut *tx, cart.id)
            .await?
            .into_iter()
            .map(|item| (item.id, item))
            .collect();

        // Lock variants in id order so concurrent checkouts cannot deadlock.
        lines.sort_by_key(|l| l.product_attribute_id);

        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            let item = display.get(&line.item_id);
            let product_name = item.map_or_else(String::new, |i| i.product_name.clone());

            if let Some(attribute_id) = line.product_attribute_id {
                let available = catalog::lock_attribute_stock(&mut *tx, attribute_id).await?;
                if available < line.quantity {
                    return Err(CheckoutError::InsufficientStock {
                        product_name,
                        available: available.max(0),
                    });
                }
                catalog::adjust_stock(&mut *tx, attribute_id, -line.quantity).await?;
            }

            let unit_price = line.current_unit_price(now);
            items.push(NewOrderItem {
                product_id: line.product_id,
                product_attribute_id: line.product_attribute_id,
                product_name,
                color_name: item.and_then(|i| i.color_name.clone()),
                size_name: item.and_then(|i| i.size_name.clone()),
                quantity: line.quantity,
                unit_price,
                total: line_total(unit_price, line.quantity),
            });
        }

        let subtotal = Totals::compute(items.iter().map(|i| i.total), Decimal::ZERO, &self.pricing)
            .subtotal;

        let mut discount_amount = Decimal::ZERO;
        let mut discount_id = None;
        if let Some(id) = cart.discount_id
            && let Some(discount) = discounts::lock_by_id(&mut *tx, id).await?
        {
            let uses = discounts::customer_usage_count(&mut *tx, id, customer_id).await?;
            discount_amount = discount.rule().redeem(subtotal, Some(uses), now)?;
            discount_id = Some(id);
        }

        let totals = Totals::from_subtotal(subtotal, discount_amount, &self.pricing);

        let order = orders::insert(
            &mut *tx,
            &NewOrder {
                order_number: generate_order_number(now),
                customer_id,
                payment_method: request.payment_method,
                discount_id,
                totals,
                shipping_name: shipping.recipient_name,
                shipping_phone: shipping.phone,
                shipping_address: shipping.full_address,
                shipping_city: shipping.city,
                notes: request.notes,
                delivery_date: request.delivery_date,
            },
        )
        .await?;

        let mut order_items = Vec::with_capacity(items.len());
        for item in &items {
            order_items.push(orders::insert_item(&mut *tx, order.id, item).await?);
        }

        if let Some(id) = discount_id {
            discounts::record_usage(&mut *tx, id, customer_id, order.id, totals.discount).await?;
        }

        let payment = payments::insert(
            &mut *tx,
            &NewPayment {
                order_id: order.id,
                amount: totals.total,
                method: request.payment_method,
                status: PaymentStatus::Pending,
                transaction_id: None,
                refund_of: None,
                notes: None,
            },
        )
        .await?;

        carts::clear_items(&mut *tx, cart.id).await?;
        carts::set_discount(&mut *tx, cart.id, None).await?;
        carts::save_totals(&mut *tx, cart.id, &Totals::default()).await?;

        tx.commit().await?;

        info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total = %order.total,
            "Order placed"
        );

        Ok(OrderDetail {
            order,
            items: order_items,
            payments: vec![payment],
        })
    }

    async fn resolve_shipping(
        &self,
        customer_id: CustomerId,
        target: &ShippingTarget,
    ) -> Result<ShippingSnapshot, CheckoutError> {
        match target {
            ShippingTarget::Saved(id) => {
                let address = AddressRepository::new(self.pool)
                    .get_for_customer(*id, customer_id)
                    .await?
                    .ok_or(CheckoutError::AddressNotFound)?;
                Ok(ShippingSnapshot {
                    full_address: address.full_address(),
                    recipient_name: address.recipient_name,
                    phone: address.phone,
                    city: address.city,
                })
            }
            ShippingTarget::Inline(address) => Ok(ShippingSnapshot {
                full_address: join_address_parts([
                    address.building.as_deref(),
                    Some(address.street.as_str()),
                    address.area.as_deref(),
                    Some(address.city.as_str()),
                    address.postal_code.as_deref(),
                ]),
                recipient_name: address.recipient_name.trim().to_string(),
                phone: address.phone.trim().to_string(),
                city: address.city.trim().to_string(),
            }),
        }
    }
}

#[derive(Debug)]
struct ShippingSnapshot {
    recipient_name: String,
    phone: String,
    full_address: String,
    city: String,
}

const ORDER_NUMBER_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// `PTL-YYYYMMDD-XXXXXX` with six random upper-case alphanumerics.
fn generate_order_number(now: DateTime<Utc>) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..6)
        .map(|_| char::from(ORDER_NUMBER_ALPHABET[rng.random_range(0..ORDER_NUMBER_ALPHABET.len())]))
        .collect();
    format!("PTL-{}-{suffix}", now.format("%Y%m%d"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_order_number_format() {
        let now = Utc.with_ymd_and_hms(2026, 3, 9, 10, 0, 0).unwrap();
        let number = generate_order_number(now);

        assert_eq!(number.len(), "PTL-20260309-XXXXXX".len());
        assert!(number.starts_with("PTL-20260309-"));
        assert!(
            number[13..]
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn test_order_numbers_differ() {
        let now = Utc::now();
        let numbers: std::collections::HashSet<_> =
            (0..50).map(|_| generate_order_number(now)).collect();
        assert!(numbers.len() > 45);
    }
}
