//! Guest cart and sign-in flows against a running storefront.
//!
//! These tests require:
//! - A migrated and seeded `PostgreSQL` database
//! - The storefront running (cargo run -p threadline-storefront)

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::json;

use threadline_integration_tests::{
    client, first_in_stock, json_body, location, register, storefront_url, unique_email,
};

// ============================================================================
// Guest Cart
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront and seeded database"]
async fn test_guest_cart_merges_repeat_adds() {
    let client = client();
    let base_url = storefront_url();
    let (product_id, variant_id) = first_in_stock(&client).await;

    for quantity in [2, 3] {
        let resp = client
            .post(format!("{base_url}/cart/add"))
            .json(&json!({"productId": product_id, "variantId": variant_id, "quantity": quantity}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let cart = json_body(client.get(format!("{base_url}/cart")).send().await.unwrap()).await;
    assert_eq!(cart["kind"], "guest");
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["items"][0]["quantity"], 5);
    assert_eq!(cart["itemCount"], 5);
}

#[tokio::test]
#[ignore = "Requires running storefront and seeded database"]
async fn test_guest_cart_update_to_zero_removes_line() {
    let client = client();
    let base_url = storefront_url();
    let (product_id, variant_id) = first_in_stock(&client).await;

    client
        .post(format!("{base_url}/cart/add"))
        .json(&json!({"productId": product_id, "variantId": variant_id}))
        .send()
        .await
        .unwrap();

    let resp = client
        .post(format!("{base_url}/cart/update"))
        .json(&json!({"productId": product_id, "variantId": variant_id, "quantity": 0}))
        .send()
        .await
        .unwrap();
    let body = json_body(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["itemCount"], 0);

    let count = json_body(
        client
            .get(format!("{base_url}/cart/count"))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(count["itemCount"], 0);
}

#[tokio::test]
#[ignore = "Requires running storefront and seeded database"]
async fn test_guest_cart_export_lists_items() {
    let client = client();
    let base_url = storefront_url();
    let (product_id, variant_id) = first_in_stock(&client).await;

    client
        .post(format!("{base_url}/cart/add"))
        .json(&json!({"productId": product_id, "variantId": variant_id, "quantity": 2}))
        .send()
        .await
        .unwrap();

    let export = json_body(
        client
            .get(format!("{base_url}/cart/export"))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(export.as_array().unwrap().len(), 1);
    assert_eq!(export[0]["variantId"], variant_id);
}

// ============================================================================
// Sign-in
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront and seeded database"]
async fn test_registration_keeps_guest_cart_for_export() {
    let client = client();
    let base_url = storefront_url();
    let (product_id, variant_id) = first_in_stock(&client).await;

    client
        .post(format!("{base_url}/cart/add"))
        .json(&json!({"productId": product_id, "variantId": variant_id, "quantity": 2}))
        .send()
        .await
        .unwrap();

    register(&client, &unique_email()).await;

    let cart = json_body(client.get(format!("{base_url}/cart")).send().await.unwrap()).await;
    assert_eq!(cart["kind"], "account");
    assert_eq!(cart["lines"].as_array().unwrap().len(), 0);

    let export = json_body(
        client
            .get(format!("{base_url}/cart/export"))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(export.as_array().unwrap().len(), 1);
    assert_eq!(export[0]["quantity"], 2);

    let resp = client
        .post(format!("{base_url}/cart/export/discard"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let export = json_body(
        client
            .get(format!("{base_url}/cart/export"))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert!(export.as_array().unwrap().is_empty());
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_guest_is_redirected_from_account() {
    let client = client();
    let resp = client
        .get(format!("{}/account", storefront_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/auth/login?redirect=%2Faccount");
}

#[tokio::test]
#[ignore = "Requires running storefront and seeded database"]
async fn test_signed_in_customer_can_open_account_and_logout() {
    let client = client();
    let base_url = storefront_url();
    register(&client, &unique_email()).await;

    let resp = client
        .get(format!("{base_url}/account"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{base_url}/auth/login"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");

    let resp = client
        .post(format!("{base_url}/auth/logout"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{base_url}/account"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
#[ignore = "Requires running storefront and seeded database"]
async fn test_duplicate_registration_conflicts() {
    let email = unique_email();
    register(&client(), &email).await;

    let resp = client()
        .post(format!("{}/auth/register", storefront_url()))
        .json(&json!({"email": email, "password": "stitch-and-hem-42"}))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_client_error());
    assert_eq!(json_body(resp).await["success"], false);
}
