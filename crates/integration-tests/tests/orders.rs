//! Integration tests for the order lifecycle.
//!
//! Customers, carts and checkout go through the storefront services on the
//! database directly (customers log in by SMS, which tests cannot receive).
//! Catalog setup, payments, refunds and cancellation go through the admin API.
//!
//! These tests require:
//! - A migrated database reachable at `DATABASE_URL`
//! - The admin service running against that database
//! - `ADMIN_TEST_EMAIL` and `ADMIN_TEST_PASSWORD` set
//!
//! Run with: cargo test -p petal-integration-tests -- --ignored

use rand::Rng;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use sqlx::PgPool;

use petal_core::{
    CustomerId, DiscountError, OrderPaymentStatus, OrderStatus, PaymentMethod, PaymentStatus,
    Phone, PricingConfig, ProductAttributeId, ProductId,
};
use petal_integration_tests::{admin_client, admin_url, json_body, test_pool, unique_suffix};
use petal_storefront::db::CustomerRepository;
use petal_storefront::models::OrderDetail;
use petal_storefront::services::{
    CartOwner, CartService, CheckoutError, CheckoutRequest, CheckoutService, ShippingAddress,
    ShippingTarget,
};

fn id_of(value: &Value) -> i32 {
    value
        .as_i64()
        .and_then(|v| i32::try_from(v).ok())
        .expect("integer id")
}

fn decimal(value: &Value) -> Decimal {
    value
        .as_str()
        .and_then(|v| v.parse().ok())
        .expect("decimal string")
}

/// A fresh active product priced 100.00 with one variant, as
/// `(product_id, attribute_id)`.
async fn create_product(admin: &Client, stock: i32) -> (ProductId, ProductAttributeId) {
    let base_url = admin_url();
    let suffix = unique_suffix();

    let resp = admin
        .post(format!("{base_url}/categories"))
        .json(&json!({ "slug": format!("order-test-{suffix}"), "name_en": "Order Test" }))
        .send()
        .await
        .expect("Failed to create category");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let category_id = id_of(&json_body(resp).await["category"]["id"]);

    let resp = admin
        .post(format!("{base_url}/products"))
        .json(&json!({
            "category_id": category_id,
            "slug": format!("order-test-{suffix}"),
            "name_en": "Order Test Bouquet",
            "price": "100.00",
        }))
        .send()
        .await
        .expect("Failed to create product");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let product_id = id_of(&json_body(resp).await["product"]["id"]);

    let resp = admin
        .post(format!("{base_url}/products/{product_id}/attributes"))
        .json(&json!({ "stock": stock }))
        .send()
        .await
        .expect("Failed to create variant");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let attribute_id = id_of(&json_body(resp).await["attribute"]["id"]);

    (ProductId::new(product_id), ProductAttributeId::new(attribute_id))
}

async fn variant_stock(admin: &Client, product_id: ProductId) -> i64 {
    let body = json_body(
        admin
            .get(format!("{}/products/{product_id}", admin_url()))
            .send()
            .await
            .expect("Failed to get product"),
    )
    .await;
    body["product"]["attributes"][0]["stock"]
        .as_i64()
        .expect("stock")
}

async fn create_customer(pool: &PgPool) -> CustomerId {
    let phone = format!("+9665{:08}", rand::rng().random_range(0..100_000_000u32));
    let phone = Phone::parse(&phone).expect("valid phone");
    CustomerRepository::new(pool)
        .create(&phone, "Order Test Customer", None)
        .await
        .expect("Failed to create customer")
        .id
}

fn checkout_request() -> CheckoutRequest {
    CheckoutRequest {
        shipping: ShippingTarget::Inline(ShippingAddress {
            recipient_name: "Order Test Customer".to_string(),
            phone: "+966500000000".to_string(),
            street: "King Fahd Road".to_string(),
            building: Some("12".to_string()),
            area: None,
            city: "Riyadh".to_string(),
            postal_code: None,
        }),
        payment_method: PaymentMethod::CashOnDelivery,
        notes: None,
        delivery_date: None,
    }
}

/// Fill a new customer's cart and check out.
async fn place_order(
    pool: &PgPool,
    product_id: ProductId,
    attribute_id: ProductAttributeId,
    quantity: i32,
) -> OrderDetail {
    let customer_id = create_customer(pool).await;
    CartService::new(pool, PricingConfig::default())
        .add_item(
            CartOwner::Customer(customer_id),
            product_id,
            Some(attribute_id),
            quantity,
        )
        .await
        .expect("Failed to add item");

    CheckoutService::new(pool, PricingConfig::default())
        .place_order(customer_id, checkout_request())
        .await
        .expect("Failed to place order")
}

async fn order(admin: &Client, order_id: impl std::fmt::Display) -> Value {
    let resp = admin
        .get(format!("{}/orders/{order_id}", admin_url()))
        .send()
        .await
        .expect("Failed to get order");
    assert_eq!(resp.status(), StatusCode::OK);
    json_body(resp).await["order"].clone()
}

async fn revenue(admin: &Client) -> Decimal {
    let body = json_body(
        admin
            .get(format!("{}/dashboard", admin_url()))
            .send()
            .await
            .expect("Failed to load dashboard"),
    )
    .await;
    decimal(&body["revenue"])
}

// ============================================================================
// Checkout
// ============================================================================

#[tokio::test]
#[ignore = "Requires database and running admin server"]
async fn test_checkout_redeems_discount_and_stock() {
    let pool = test_pool().await;
    let admin = admin_client().await;
    let base_url = admin_url();
    let (product_id, attribute_id) = create_product(&admin, 5).await;

    let code = format!("ONCE{}", unique_suffix()).to_uppercase();
    let resp = admin
        .post(format!("{base_url}/discounts"))
        .json(&json!({
            "code": code,
            "kind": "fixed",
            "value": "10.00",
            "usage_limit": 1,
        }))
        .send()
        .await
        .expect("Failed to create discount");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let discount_id = id_of(&json_body(resp).await["discount"]["id"]);

    // Both customers attach the single-use code before either checks out
    let carts = CartService::new(&pool, PricingConfig::default());
    let first = create_customer(&pool).await;
    let second = create_customer(&pool).await;
    for customer in [first, second] {
        let owner = CartOwner::Customer(customer);
        carts
            .add_item(owner, product_id, Some(attribute_id), 2)
            .await
            .expect("Failed to add item");
        let view = carts
            .apply_discount(owner, &code)
            .await
            .expect("Failed to apply discount");
        assert_eq!(view.discount_code.as_deref(), Some(code.as_str()));
    }

    let checkout = CheckoutService::new(&pool, PricingConfig::default());
    let detail = checkout
        .place_order(first, checkout_request())
        .await
        .expect("Failed to place order");

    assert_eq!(detail.order.status, OrderStatus::Pending);
    assert_eq!(detail.order.payment_status, OrderPaymentStatus::Unpaid);
    assert_eq!(detail.order.discount_amount, Decimal::new(1000, 2));
    assert_eq!(
        detail.order.total,
        detail.order.subtotal + detail.order.tax + detail.order.shipping
            - detail.order.discount_amount
    );
    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.items[0].quantity, 2);
    assert_eq!(detail.payments.len(), 1);
    assert_eq!(detail.payments[0].amount, detail.order.total);
    assert_eq!(detail.payments[0].status, PaymentStatus::Pending);

    // Stock is taken and the cart emptied
    assert_eq!(variant_stock(&admin, product_id).await, 3);
    let view = carts
        .view(CartOwner::Customer(first))
        .await
        .expect("Failed to load cart");
    assert!(view.items.is_empty());
    assert!(view.discount_code.is_none());

    // Redemption is recorded
    let usages: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM discount_usages WHERE order_id = $1")
            .bind(detail.order.id)
            .fetch_one(&pool)
            .await
            .expect("Failed to count usages");
    assert_eq!(usages, 1);
    let body = json_body(
        admin
            .get(format!("{base_url}/discounts/{discount_id}"))
            .send()
            .await
            .expect("Failed to get discount"),
    )
    .await;
    assert_eq!(body["discount"]["used_count"], 1);

    // The code is used up, so the second checkout is refused and writes nothing
    let err = checkout
        .place_order(second, checkout_request())
        .await
        .expect_err("checkout past the usage limit");
    assert!(matches!(
        err,
        CheckoutError::Discount(DiscountError::UsageLimitReached)
    ));
    assert_eq!(variant_stock(&admin, product_id).await, 3);
    let view = carts
        .view(CartOwner::Customer(second))
        .await
        .expect("Failed to load cart");
    assert_eq!(view.item_count, 2);
}

#[tokio::test]
#[ignore = "Requires database and running admin server"]
async fn test_checkout_refuses_oversold_stock() {
    let pool = test_pool().await;
    let admin = admin_client().await;
    let (product_id, attribute_id) = create_product(&admin, 3).await;

    let customer = create_customer(&pool).await;
    let carts = CartService::new(&pool, PricingConfig::default());
    carts
        .add_item(CartOwner::Customer(customer), product_id, Some(attribute_id), 3)
        .await
        .expect("Failed to add item");

    // Someone else buys one first
    place_order(&pool, product_id, attribute_id, 1).await;

    let err = CheckoutService::new(&pool, PricingConfig::default())
        .place_order(customer, checkout_request())
        .await
        .expect_err("checkout beyond stock");
    assert!(matches!(
        err,
        CheckoutError::InsufficientStock { available: 2, .. }
    ));
    assert_eq!(variant_stock(&admin, product_id).await, 2);
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_concurrent_first_requests_share_one_cart() {
    let pool = test_pool().await;
    let customer = create_customer(&pool).await;
    let carts = CartService::new(&pool, PricingConfig::default());

    let owner = CartOwner::Customer(customer);
    let (a, b) = tokio::join!(carts.view(owner), carts.view(owner));
    let (a, b) = (a.expect("first view"), b.expect("second view"));
    assert_eq!(a.cart.id, b.cart.id);
}

// ============================================================================
// Payments & Refunds
// ============================================================================

#[tokio::test]
#[ignore = "Requires database and running admin server"]
async fn test_partial_then_full_refund() {
    let pool = test_pool().await;
    let admin = admin_client().await;
    let base_url = admin_url();
    let (product_id, attribute_id) = create_product(&admin, 5).await;

    let detail = place_order(&pool, product_id, attribute_id, 1).await;
    let order_id = detail.order.id;
    let total = detail.order.total;
    let payment_id = detail.payments[0].id;
    let revenue_before = revenue(&admin).await;

    // Capture the pending payment
    let resp = admin
        .put(format!("{base_url}/payments/{payment_id}/status"))
        .json(&json!({ "status": "completed", "transaction_id": "COD-RECEIPT-1" }))
        .send()
        .await
        .expect("Failed to complete payment");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(order(&admin, order_id).await["payment_status"], "paid");
    assert_eq!(revenue(&admin).await - revenue_before, total);

    // Partial refund
    let resp = admin
        .post(format!("{base_url}/payments/{payment_id}/refund"))
        .json(&json!({ "amount": "30.00", "reason": "Wilted stems" }))
        .send()
        .await
        .expect("Failed to refund");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = json_body(resp).await;
    assert_eq!(decimal(&body["refund"]["amount"]), Decimal::new(-3000, 2));
    assert_eq!(body["refund"]["refund_of"], json!(payment_id));
    assert_eq!(body["payment"]["status"], "completed");
    assert_eq!(
        order(&admin, order_id).await["payment_status"],
        "partially_refunded"
    );
    assert_eq!(
        revenue(&admin).await - revenue_before,
        total - Decimal::new(3000, 2)
    );

    // More than what remains is refused
    let resp = admin
        .post(format!("{base_url}/payments/{payment_id}/refund"))
        .json(&json!({ "amount": total.to_string() }))
        .send()
        .await
        .expect("Failed to refund");
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Refund the rest
    let resp = admin
        .post(format!("{base_url}/payments/{payment_id}/refund"))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to refund");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = json_body(resp).await;
    assert_eq!(
        decimal(&body["refund"]["amount"]),
        Decimal::new(3000, 2) - total
    );
    assert_eq!(body["payment"]["status"], "refunded");

    let order = order(&admin, order_id).await;
    assert_eq!(order["payment_status"], "refunded");
    assert_eq!(order["payments"].as_array().map(Vec::len), Some(3));

    // A fully refunded payment nets to nothing
    assert_eq!(revenue(&admin).await, revenue_before);

    // Nothing is left to refund
    let resp = admin
        .post(format!("{base_url}/payments/{payment_id}/refund"))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to refund");
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
#[ignore = "Requires database and running admin server"]
async fn test_cancel_restores_stock() {
    let pool = test_pool().await;
    let admin = admin_client().await;
    let base_url = admin_url();
    let (product_id, attribute_id) = create_product(&admin, 5).await;

    let detail = place_order(&pool, product_id, attribute_id, 2).await;
    let order_id = detail.order.id;
    assert_eq!(variant_stock(&admin, product_id).await, 3);

    let resp = admin
        .put(format!("{base_url}/orders/{order_id}/status"))
        .json(&json!({ "status": "cancelled" }))
        .send()
        .await
        .expect("Failed to cancel order");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["order"]["status"], "cancelled");
    assert_eq!(variant_stock(&admin, product_id).await, 5);

    // Cancelled is final, so stock cannot be restored twice
    let resp = admin
        .put(format!("{base_url}/orders/{order_id}/status"))
        .json(&json!({ "status": "cancelled" }))
        .send()
        .await
        .expect("Failed to cancel order");
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(variant_stock(&admin, product_id).await, 5);
}
