//! Admin console access and order workflow against running servers.
//!
//! These tests require:
//! - A migrated and seeded `PostgreSQL` database
//! - Both binaries running
//! - `TEST_ADMIN_EMAIL` / `TEST_ADMIN_PASSWORD` for an admin account

#![allow(clippy::unwrap_used)]

use reqwest::{Client, StatusCode};
use serde_json::json;

use threadline_integration_tests::{
    admin_url, client, json_body, location, register, storefront_url, unique_email,
};

async fn admin_client() -> Client {
    let client = client();
    let email = std::env::var("TEST_ADMIN_EMAIL").expect("TEST_ADMIN_EMAIL is set");
    let password = std::env::var("TEST_ADMIN_PASSWORD").expect("TEST_ADMIN_PASSWORD is set");

    let resp = client
        .post(format!("{}/auth/login", admin_url()))
        .json(&json!({"email": email, "password": password}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    client
}

// ============================================================================
// Access
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_guest_is_sent_to_console_login() {
    let resp = client()
        .get(format!("{}/admin/orders", admin_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/auth/login?redirect=%2Fadmin%2Forders");
}

#[tokio::test]
#[ignore = "Requires running storefront, admin server and database"]
async fn test_customer_credentials_are_refused() {
    let email = unique_email();
    register(&client(), &email).await;

    let resp = client()
        .post(format!("{}/auth/login", admin_url()))
        .json(&json!({"email": email, "password": "stitch-and-hem-42"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(resp).await["message"], "Admin access required");
}

#[tokio::test]
#[ignore = "Requires running storefront and admin server"]
async fn test_storefront_cookie_does_not_open_console() {
    let client = client();
    register(&client, &unique_email()).await;
    assert!(storefront_url() != admin_url());

    let resp = client
        .get(format!("{}/admin", admin_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
}

// ============================================================================
// Console
// ============================================================================

// Sign-in is rate limited per IP, so console checks share one login.
#[tokio::test]
#[ignore = "Requires running admin server and an admin account"]
async fn test_console_reads_and_rejections() {
    let client = admin_client().await;
    let base_url = admin_url();

    let stats = json_body(client.get(format!("{base_url}/admin")).send().await.unwrap()).await;
    assert!(stats["activeProducts"].as_i64().unwrap() >= 1);

    let resp = client
        .post(format!("{base_url}/admin/content/Not%20A%20Key"))
        .json(&json!({"headline": "Hello"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .get(format!("{base_url}/admin/orders/TL-19990101-00000000"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let page = json_body(
        client
            .get(format!("{base_url}/admin/orders?status=pending"))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(page["perPage"], 25);
    assert_eq!(page["status"], "pending");
}

#[tokio::test]
#[ignore = "Requires running both servers and an admin account"]
async fn test_content_round_trip_to_storefront() {
    let client = admin_client().await;
    let key = format!("it-{}", uuid::Uuid::new_v4().simple());

    let resp = client
        .post(format!("{}/admin/content/{key}", admin_url()))
        .json(&json!({"headline": "Autumn threads"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let block = json_body(
        client
            .get(format!("{}/content/{key}", storefront_url()))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(block["value"]["headline"], "Autumn threads");

    let resp = client
        .post(format!("{}/admin/content/{key}/delete", admin_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
