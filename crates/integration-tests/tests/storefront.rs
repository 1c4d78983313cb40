//! Integration tests for the storefront API.
//!
//! These tests require:
//! - A migrated and seeded database (`petal migrate`, `petal seed catalog`)
//! - The storefront running with `OTP_PROVIDER=sandbox`
//!
//! Run with: cargo test -p petal-integration-tests -- --ignored

use rand::Rng;
use reqwest::StatusCode;
use serde_json::{Value, json};

use petal_integration_tests::{client, json_body, storefront_url};

/// First seeded product that has variants, as `(product_id, attribute_id)`.
async fn product_with_variant(client: &reqwest::Client) -> (i64, i64) {
    let base_url = storefront_url();
    let products = json_body(
        client
            .get(format!("{base_url}/api/products?per_page=50"))
            .send()
            .await
            .expect("Failed to list products"),
    )
    .await;

    for product in products["data"].as_array().expect("data array") {
        let id = product["id"].as_i64().expect("product id");
        let detail = json_body(
            client
                .get(format!("{base_url}/api/products/{id}"))
                .send()
                .await
                .expect("Failed to get product"),
        )
        .await;
        if let Some(attribute) = detail["data"]["attributes"]
            .as_array()
            .and_then(|a| a.first())
        {
            return (id, attribute["id"].as_i64().expect("attribute id"));
        }
    }
    panic!("no product with variants; run `petal seed catalog`");
}

fn random_phone() -> String {
    format!("+9665{:08}", rand::rng().random_range(0..100_000_000u32))
}

// ============================================================================
// Health & Catalog
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_health() {
    let resp = client()
        .get(format!("{}/health/ready", storefront_url()))
        .send()
        .await
        .expect("Failed to reach storefront");

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_product_listing_is_paginated() {
    let resp = client()
        .get(format!("{}/api/products?per_page=2&page=1", storefront_url()))
        .send()
        .await
        .expect("Failed to list products");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["per_page"], 2);
    assert_eq!(body["page"], 1);
    assert!(body["data"].as_array().expect("data array").len() <= 2);
    assert!(body["last_page"].as_i64().expect("last_page") >= 1);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_categories_are_localized() {
    let resp = client()
        .get(format!("{}/api/categories", storefront_url()))
        .header("Accept-Language", "ar")
        .send()
        .await
        .expect("Failed to list categories");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert!(body["data"].is_array());
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_unknown_product_is_404() {
    let resp = client()
        .get(format!("{}/api/products/2147483647", storefront_url()))
        .send()
        .await
        .expect("Failed to get product");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(json_body(resp).await["error"].is_string());
}

// ============================================================================
// Guest Cart
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_guest_cart_lifecycle() {
    let client = client();
    let base_url = storefront_url();
    let (product_id, attribute_id) = product_with_variant(&client).await;

    // Add
    let resp = client
        .post(format!("{base_url}/api/cart/items"))
        .json(&json!({
            "product_id": product_id,
            "product_attribute_id": attribute_id,
            "quantity": 2,
        }))
        .send()
        .await
        .expect("Failed to add item");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = json_body(resp).await;
    assert_eq!(body["cart"]["item_count"], 2);
    let item_id = body["cart"]["items"][0]["id"].as_i64().expect("item id");

    // The guest cart follows the session cookie
    let body = json_body(
        client
            .get(format!("{base_url}/api/cart"))
            .send()
            .await
            .expect("Failed to show cart"),
    )
    .await;
    assert_eq!(body["cart"]["items"].as_array().map(Vec::len), Some(1));

    // Unknown discount codes are rejected
    let resp = client
        .post(format!("{base_url}/api/cart/discount"))
        .json(&json!({ "code": "NO-SUCH-CODE" }))
        .send()
        .await
        .expect("Failed to apply discount");
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Change quantity
    let resp = client
        .patch(format!("{base_url}/api/cart/items/{item_id}"))
        .json(&json!({ "quantity": 1 }))
        .send()
        .await
        .expect("Failed to update item");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["cart"]["item_count"], 1);

    // Remove
    let resp = client
        .delete(format!("{base_url}/api/cart/items/{item_id}"))
        .send()
        .await
        .expect("Failed to remove item");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = json_body(resp).await;
    assert_eq!(body["cart"]["items"].as_array().map(Vec::len), Some(0));
    let total: f64 = body["cart"]["total"]
        .as_str()
        .and_then(|t| t.parse().ok())
        .expect("total as decimal string");
    assert!(total.abs() < f64::EPSILON);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_checkout_requires_login() {
    let resp = client()
        .post(format!("{}/api/checkout", storefront_url()))
        .json(&json!({ "payment_method": "cash_on_delivery" }))
        .send()
        .await
        .expect("Failed to check out");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// OTP
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server with OTP_PROVIDER=sandbox"]
async fn test_otp_send_then_wrong_code() {
    let client = client();
    let base_url = storefront_url();
    let phone = random_phone();

    let resp = client
        .post(format!("{base_url}/api/send-otp"))
        .json(&json!({ "phone": phone }))
        .send()
        .await
        .expect("Failed to send OTP");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["phone"], phone);
    assert!(body["expires_in"].as_u64().expect("expires_in") > 0);

    // An immediate resend hits the cooldown
    let resp = client
        .post(format!("{base_url}/api/send-otp"))
        .json(&json!({ "phone": phone }))
        .send()
        .await
        .expect("Failed to resend OTP");
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

    let resp = client
        .post(format!("{base_url}/api/verify-otp"))
        .json(&json!({ "phone": phone, "code": "000000" }))
        .send()
        .await
        .expect("Failed to verify OTP");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
