//! Saved addresses and the selected-address fallback.

use reqwest::StatusCode;
use serde_json::{Value, json};

use nightcap_integration_tests::TestContext;

fn new_address(name: &str) -> Value {
    json!({
        "name": name,
        "address": format!("{name} Blvd 1, Tel Aviv"),
        "coordinates": { "lat": 32.06, "lng": 34.77 },
        "floor": "3",
    })
}

#[tokio::test]
async fn test_first_address_becomes_selected() {
    let ctx = TestContext::new().await;
    ctx.sign_in().await;

    let (status, book) = ctx.get("/api/addresses").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(book["addresses"], json!([]));
    assert!(book["selected_id"].is_null());

    let (status, book) = ctx.post("/api/addresses", new_address("Home")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(book["selected_id"], 1);

    // A second address doesn't steal the selection
    let (_, book) = ctx.post("/api/addresses", new_address("Office")).await;
    assert_eq!(book["addresses"].as_array().map(Vec::len), Some(2));
    assert_eq!(book["selected_id"], 1);

    let (_, selected) = ctx.get("/api/addresses/selected").await;
    assert_eq!(selected["name"], "Home");
}

#[tokio::test]
async fn test_create_requires_address_line() {
    let ctx = TestContext::new().await;
    ctx.sign_in().await;

    let mut body = new_address("Home");
    body["address"] = json!("   ");
    let (status, _) = ctx.post("/api/addresses", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_deleting_selected_address_falls_back() {
    let ctx = TestContext::new().await;
    ctx.sign_in().await;
    ctx.post("/api/addresses", new_address("Home")).await;
    ctx.post("/api/addresses", new_address("Office")).await;

    let (status, body) = ctx
        .put("/api/addresses/selected", json!({ "address_id": 2 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["address"]["id"], 2);

    let (status, book) = ctx.delete("/api/addresses/2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(book["selected_id"], 1);

    let (status, _) = ctx.delete("/api/addresses/1").await;
    assert_eq!(status, StatusCode::OK);

    let (_, selected) = ctx.get("/api/addresses/selected").await;
    assert!(selected.is_null());
}

#[tokio::test]
async fn test_selecting_unknown_or_deleted_address_fails() {
    let ctx = TestContext::new().await;
    ctx.sign_in().await;
    ctx.post("/api/addresses", new_address("Home")).await;
    ctx.post("/api/addresses", new_address("Office")).await;
    ctx.delete("/api/addresses/2").await;

    let (status, _) = ctx
        .put("/api/addresses/selected", json!({ "address_id": 42 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .put("/api/addresses/selected", json!({ "address_id": 2 }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, book) = ctx.get("/api/addresses").await;
    assert_eq!(book["selected_id"], 1);
}

#[tokio::test]
async fn test_selecting_address_quotes_delivery() {
    let ctx = TestContext::new().await;
    ctx.sign_in().await;
    ctx.post("/api/addresses", new_address("Home")).await;

    // No business yet, so no quote
    let (_, body) = ctx
        .put("/api/addresses/selected", json!({ "address_id": 1 }))
        .await;
    assert!(body["delivery_quote"].is_null());

    ctx.select_business(1).await;
    let (status, body) = ctx
        .put("/api/addresses/selected", json!({ "address_id": 1 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["delivery_quote"]["available"], true);
    assert_eq!(body["delivery_quote"]["eta_minutes"], 36);
}

#[tokio::test]
async fn test_address_search() {
    let ctx = TestContext::new().await;
    ctx.sign_in().await;

    let (status, suggestions) = ctx.get("/api/addresses/search?q=Rothschild").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(suggestions[0]["label"], "Rothschild, Tel Aviv");

    let (status, _) = ctx.get("/api/addresses/search?q=R").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_addresses_seeded_elsewhere_are_picked_up() {
    let ctx = TestContext::new().await;
    let id = ctx.backend().seed_address("Parents");
    ctx.sign_in().await;

    let (_, book) = ctx.get("/api/addresses").await;
    assert_eq!(book["selected_id"], id);
}
