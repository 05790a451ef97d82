//! Integration tests for Threadline.
//!
//! # Running Tests
//!
//! ```bash
//! tl-cli migrate
//! tl-cli seed catalog -f seed/catalog.yaml
//! tl-cli admin create -e "$TEST_ADMIN_EMAIL" -n Ops -p "$TEST_ADMIN_PASSWORD"
//! cargo run -p threadline-storefront &
//! cargo run -p threadline-admin &
//! cargo test -p threadline-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_BASE_URL` - default `http://localhost:3000`
//! - `ADMIN_BASE_URL` - default `http://localhost:3001`
//! - `TEST_ADMIN_EMAIL` / `TEST_ADMIN_PASSWORD` - an account made with `tl-cli admin create`

use reqwest::{Client, Response, StatusCode, redirect};
use serde_json::{Value, json};

/// Base URL for the storefront.
#[must_use]
pub fn storefront_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Base URL for the admin console.
#[must_use]
pub fn admin_url() -> String {
    std::env::var("ADMIN_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// A client with its own cookie jar that does not follow redirects, so
/// tests can assert on `303` responses and their `Location`.
///
/// # Panics
///
/// Panics if the TLS backend cannot be initialised.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// A fresh, unused email address.
#[must_use]
pub fn unique_email() -> String {
    format!("it-{}@threadline.test", uuid::Uuid::new_v4().simple())
}

/// Read a JSON body.
///
/// # Panics
///
/// Panics if the body is not JSON.
pub async fn json_body(response: Response) -> Value {
    response.json().await.expect("response body is JSON")
}

/// The `Location` header of a redirect.
///
/// # Panics
///
/// Panics if the response has no readable `Location`.
#[must_use]
pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("redirect has a Location header")
        .to_owned()
}

/// Register a customer on `client` and leave it signed in.
///
/// # Panics
///
/// Panics if registration fails.
pub async fn register(client: &Client, email: &str) {
    let response = client
        .post(format!("{}/auth/register", storefront_url()))
        .json(&json!({
            "email": email,
            "password": "stitch-and-hem-42",
            "passwordConfirm": "stitch-and-hem-42",
            "name": "Integration Tester",
        }))
        .send()
        .await
        .expect("register request");
    assert_eq!(response.status(), StatusCode::OK);
}

/// The first in-stock variant of the first listed product, as
/// `(productId, variantId)`.
///
/// # Panics
///
/// Panics if the catalog has no purchasable variant.
pub async fn first_in_stock(client: &Client) -> (i64, i64) {
    let page = json_body(
        client
            .get(format!("{}/products", storefront_url()))
            .send()
            .await
            .expect("product list request"),
    )
    .await;

    for product in page["products"].as_array().into_iter().flatten() {
        let slug = product["slug"].as_str().unwrap_or_default();
        let detail = json_body(
            client
                .get(format!("{}/products/{slug}", storefront_url()))
                .send()
                .await
                .expect("product detail request"),
        )
        .await;

        let variant = detail["variants"]
            .as_array()
            .into_iter()
            .flatten()
            .find(|v| v["inStock"] == true);
        if let (Some(product_id), Some(variant_id)) = (
            detail["id"].as_i64(),
            variant.and_then(|v| v["id"].as_i64()),
        ) {
            return (product_id, variant_id);
        }
    }
    panic!("no in-stock variant; run `tl-cli seed catalog` first");
}
