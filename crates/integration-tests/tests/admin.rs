//! Integration tests for the admin API.
//!
//! These tests require:
//! - A migrated database with an admin (not viewer) account
//! - The admin service running
//! - `ADMIN_TEST_EMAIL` and `ADMIN_TEST_PASSWORD` set
//!
//! Run with: cargo test -p petal-integration-tests -- --ignored

use reqwest::StatusCode;
use serde_json::json;

use petal_integration_tests::{admin_client, admin_url, client, json_body, unique_suffix};

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_requires_login() {
    let client = client();
    let base_url = admin_url();

    for path in ["/dashboard", "/products", "/orders", "/auth/me"] {
        let resp = client
            .get(format!("{base_url}{path}"))
            .send()
            .await
            .expect("Failed to reach admin");
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "GET {path}");
    }
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_login_rejects_wrong_password() {
    let resp = client()
        .post(format!("{}/auth/login", admin_url()))
        .json(&json!({ "email": "nobody@example.com", "password": "wrong-password" }))
        .send()
        .await
        .expect("Failed to log in");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_login_me_logout() {
    let client = admin_client().await;
    let base_url = admin_url();

    let resp = client
        .get(format!("{base_url}/auth/me"))
        .send()
        .await
        .expect("Failed to get current admin");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    let expected = std::env::var("ADMIN_TEST_EMAIL").expect("ADMIN_TEST_EMAIL not set");
    assert_eq!(body["admin"]["email"], expected.to_lowercase());
    assert!(body["admin"].get("password_hash").is_none());

    let resp = client
        .post(format!("{base_url}/auth/logout"))
        .send()
        .await
        .expect("Failed to log out");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{base_url}/auth/me"))
        .send()
        .await
        .expect("Failed to get current admin");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Dashboard
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_dashboard() {
    let resp = admin_client()
        .await
        .get(format!("{}/dashboard", admin_url()))
        .send()
        .await
        .expect("Failed to load dashboard");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    for key in ["products", "customers", "orders", "pending_orders", "revenue"] {
        assert!(!body[key].is_null(), "missing {key}");
    }
    assert!(body["recent_orders"].is_array());
}

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_color_crud() {
    let client = admin_client().await;
    let base_url = admin_url();
    let name = format!("Test Color {}", unique_suffix());

    let resp = client
        .post(format!("{base_url}/colors"))
        .json(&json!({ "name_en": name, "hex_code": "#123abc" }))
        .send()
        .await
        .expect("Failed to create color");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let id = json_body(resp).await["color"]["id"]
        .as_i64()
        .expect("color id");

    let resp = client
        .put(format!("{base_url}/colors/{id}"))
        .json(&json!({ "name_en": name, "name_ar": "لون", "hex_code": "#abcdef" }))
        .send()
        .await
        .expect("Failed to update color");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["color"]["hex_code"], "#abcdef");
    assert_eq!(body["color"]["name_ar"], "لون");

    let resp = client
        .delete(format!("{base_url}/colors/{id}"))
        .send()
        .await
        .expect("Failed to delete color");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .delete(format!("{base_url}/colors/{id}"))
        .send()
        .await
        .expect("Failed to delete color");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_color_rejects_bad_hex() {
    let resp = admin_client()
        .await
        .post(format!("{}/colors", admin_url()))
        .json(&json!({ "name_en": "Nope", "hex_code": "red" }))
        .send()
        .await
        .expect("Failed to create color");

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json_body(resp).await["errors"]["hex_code"].is_array());
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_product_with_variants_and_occasions() {
    let client = admin_client().await;
    let base_url = admin_url();
    let suffix = unique_suffix();

    // Category
    let resp = client
        .post(format!("{base_url}/categories"))
        .json(&json!({ "slug": format!("test-{suffix}"), "name_en": "Test Category" }))
        .send()
        .await
        .expect("Failed to create category");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let category_id = json_body(resp).await["category"]["id"]
        .as_i64()
        .expect("category id");

    // Occasion
    let resp = client
        .post(format!("{base_url}/occasions"))
        .json(&json!({ "slug": format!("test-{suffix}"), "name_en": "Test Occasion" }))
        .send()
        .await
        .expect("Failed to create occasion");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let occasion_id = json_body(resp).await["occasion"]["id"]
        .as_i64()
        .expect("occasion id");

    // A sale price above the regular price is rejected
    let resp = client
        .post(format!("{base_url}/products"))
        .json(&json!({
            "category_id": category_id,
            "slug": format!("test-product-{suffix}"),
            "name_en": "Test Product",
            "price": "100.00",
            "discount_price": "120.00",
        }))
        .send()
        .await
        .expect("Failed to create product");
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json_body(resp).await["errors"]["discount_price"].is_array());

    let resp = client
        .post(format!("{base_url}/products"))
        .json(&json!({
            "category_id": category_id,
            "slug": format!("test-product-{suffix}"),
            "name_en": "Test Product",
            "price": "100.00",
            "discount_price": "80.00",
        }))
        .send()
        .await
        .expect("Failed to create product");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let product_id = json_body(resp).await["product"]["id"]
        .as_i64()
        .expect("product id");

    // Variant
    let resp = client
        .post(format!("{base_url}/products/{product_id}/attributes"))
        .json(&json!({ "stock": 5, "price_adjustment": "10.00" }))
        .send()
        .await
        .expect("Failed to create variant");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let attribute_id = json_body(resp).await["attribute"]["id"]
        .as_i64()
        .expect("attribute id");

    let resp = client
        .put(format!(
            "{base_url}/products/{product_id}/attributes/{attribute_id}"
        ))
        .json(&json!({ "stock": 0, "price_adjustment": "10.00" }))
        .send()
        .await
        .expect("Failed to update variant");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["attribute"]["stock"], 0);

    // Occasions
    let resp = client
        .put(format!("{base_url}/products/{product_id}/occasions"))
        .json(&json!({ "occasion_ids": [occasion_id] }))
        .send()
        .await
        .expect("Failed to set occasions");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["occasions"].as_array().map(Vec::len), Some(1));

    // Detail includes the variant
    let resp = client
        .get(format!("{base_url}/products/{product_id}"))
        .send()
        .await
        .expect("Failed to get product");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["product"]["attributes"].as_array().map(Vec::len), Some(1));

    // Search finds it
    let resp = client
        .get(format!("{base_url}/products?search={suffix}"))
        .send()
        .await
        .expect("Failed to list products");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["total"], 1);

    // Cleanup
    for path in [
        format!("/products/{product_id}"),
        format!("/occasions/{occasion_id}"),
        format!("/categories/{category_id}"),
    ] {
        let resp = client
            .delete(format!("{base_url}{path}"))
            .send()
            .await
            .expect("Failed to clean up");
        assert_eq!(resp.status(), StatusCode::OK, "DELETE {path}");
    }
}

// ============================================================================
// Promotions & Sales
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_discount_percentage_over_100_is_rejected() {
    let resp = admin_client()
        .await
        .post(format!("{}/discounts", admin_url()))
        .json(&json!({
            "code": format!("TEST{}", unique_suffix()),
            "kind": "percentage",
            "value": "150",
        }))
        .send()
        .await
        .expect("Failed to create discount");

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json_body(resp).await["errors"]["value"].is_array());
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_discount_crud() {
    let client = admin_client().await;
    let base_url = admin_url();
    let code = format!("TEST{}", unique_suffix());

    let resp = client
        .post(format!("{base_url}/discounts"))
        .json(&json!({
            "code": code,
            "kind": "fixed",
            "value": "25.00",
            "usage_limit": 10,
        }))
        .send()
        .await
        .expect("Failed to create discount");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let id = json_body(resp).await["discount"]["id"]
        .as_i64()
        .expect("discount id");

    let resp = client
        .get(format!("{base_url}/discounts/{id}"))
        .send()
        .await
        .expect("Failed to get discount");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .delete(format!("{base_url}/discounts/{id}"))
        .send()
        .await
        .expect("Failed to delete discount");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_unknown_order_is_404() {
    let resp = admin_client()
        .await
        .get(format!("{}/orders/2147483647", admin_url()))
        .send()
        .await
        .expect("Failed to get order");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_bad_status_filter_is_rejected() {
    let resp = admin_client()
        .await
        .get(format!("{}/orders?status=lost", admin_url()))
        .send()
        .await
        .expect("Failed to list orders");

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json_body(resp).await["errors"]["status"].is_array());
}
