//! Business selection and catalog browsing.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::json;

use nightcap_integration_tests::{TestContext, TestOptions};

#[tokio::test]
async fn test_list_and_select_business() {
    let ctx = TestContext::new().await;

    let (status, businesses) = ctx.get("/api/businesses").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(businesses.as_array().map(Vec::len), Some(2));

    let (_, selected) = ctx.get("/api/businesses/selected").await;
    assert!(selected.is_null());

    let body = ctx.select_business(1).await;
    assert_eq!(body["business"]["id"], 1);
    assert_eq!(body["change"]["previous"], json!(null));
    assert_eq!(body["cart_cleared"], false);

    let (_, selected) = ctx.get("/api/businesses/selected").await;
    assert_eq!(selected["name"], "Nightcap Dizengoff");

    // Re-selecting the same business is not a change
    let body = ctx.select_business(1).await;
    assert!(body["change"].is_null());
}

#[tokio::test]
async fn test_select_unknown_business_is_not_found() {
    let ctx = TestContext::new().await;

    let (status, _) = ctx
        .put("/api/businesses/selected", json!({ "business_id": 99 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_business_change_keeps_cart_by_default() {
    let ctx = TestContext::new().await;
    ctx.select_business(1).await;
    ctx.add_to_cart(10, 1).await;

    let body = ctx.select_business(2).await;
    assert_eq!(body["change"]["previous"], 1);
    assert_eq!(body["change"]["current"], 2);
    assert_eq!(body["cart_cleared"], false);

    let (_, count) = ctx.get("/api/cart/count").await;
    assert_eq!(count["count"], 1);
}

#[tokio::test]
async fn test_business_change_clears_cart_when_enabled() {
    let ctx = TestContext::with_options(TestOptions {
        clear_cart_on_business_change: true,
        ..TestOptions::default()
    })
    .await;
    ctx.select_business(1).await;
    ctx.add_to_cart(10, 2).await;

    let body = ctx.select_business(2).await;
    assert_eq!(body["cart_cleared"], true);

    let (_, cart) = ctx.get("/api/cart").await;
    assert_eq!(cart["items"], json!([]));
}

#[tokio::test]
async fn test_first_selection_never_clears_cart() {
    let ctx = TestContext::with_options(TestOptions {
        clear_cart_on_business_change: true,
        ..TestOptions::default()
    })
    .await;
    ctx.add_to_cart(20, 1).await;

    let body = ctx.select_business(2).await;
    assert_eq!(body["cart_cleared"], false);

    let (_, count) = ctx.get("/api/cart/count").await;
    assert_eq!(count["count"], 1);
}

#[tokio::test]
async fn test_catalog_browsing() {
    let ctx = TestContext::new().await;

    let (status, categories) = ctx.get("/api/businesses/1/categories").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(categories[0]["name"], "Spirits");

    let (status, items) = ctx.get("/api/businesses/1/categories/1/items").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(items.as_array().map(Vec::len), Some(3));

    let (status, item) = ctx.get("/api/items/12").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["modifier_groups"][0]["max_select"], 1);
    assert_eq!(item["modifier_groups"][0]["options"][1]["pricing"], "REPLACE");

    let (status, _) = ctx.get("/api/items/404").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_item_is_served_from_cache() {
    let ctx = TestContext::new().await;

    let (status, first) = ctx.get("/api/items/12").await;
    assert_eq!(status, StatusCode::OK);
    let (status, second) = ctx.get("/api/items/12").await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(first, second);
    assert_eq!(ctx.backend().item_hits, 1);
}

#[tokio::test]
async fn test_remembered_businesses_cover_backend_outage() {
    let ctx = TestContext::with_options(TestOptions {
        catalog_cache_ttl: Some(Duration::from_millis(50)),
        ..TestOptions::default()
    })
    .await;

    let (status, listed) = ctx.get("/api/businesses").await;
    assert_eq!(status, StatusCode::OK);

    ctx.backend().fail_businesses = Some(StatusCode::SERVICE_UNAVAILABLE);
    tokio::time::sleep(Duration::from_millis(150)).await;

    let (status, fallback) = ctx.get("/api/businesses").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fallback, listed);

    // A visitor who never saw the list gets the error
    let stranger = reqwest::Client::new();
    let response = stranger
        .get(ctx.url("/api/businesses"))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}
