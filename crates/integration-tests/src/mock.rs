//! In-process stand-in for the ordering backend.
//!
//! Speaks the same REST shapes as the real backend, with a fixed catalog:
//!
//! | Business | Item | Price | Stock | Notes |
//! |----------|------|-------|-------|-------|
//! | 1 | 10 Negroni Kit | 50.00 | 3 | |
//! | 1 | 11 Sold Out Mezcal | 120.00 | 0 | |
//! | 1 | 12 House Gin | 100.00 | 5 | size (pick 1, REPLACE) + extras (ADD) |
//! | 2 | 20 Lager Six-Pack | 30.00 | 10 | |
//!
//! Authenticated endpoints accept only `Bearer` [`TEST_TOKEN`]. The sign-in
//! code is [`TEST_CODE`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};

/// Code the mock accepts at verify.
pub const TEST_CODE: &str = "1234";
/// Bearer token issued on a successful verify.
pub const TEST_TOKEN: &str = "tok-test-customer";

const SESSION_TOKEN: &str = "otp-session-1";

/// Mutable backend state.
#[derive(Debug, Default)]
pub struct MockBackend {
    pub addresses: Vec<Value>,
    pub cards: Vec<Value>,
    /// Order bodies as the storefront submitted them.
    pub order_requests: Vec<Value>,
    pub orders: Vec<Value>,
    pub send_code_calls: usize,
    pub card_setup_return_urls: Vec<String>,
    /// Requests served by `GET /items/{id}`.
    pub item_hits: usize,
    /// Stock levels that replace the fixture's, by item ID.
    pub stock: HashMap<i64, u32>,
    /// When set, `GET /businesses` answers with this status.
    pub fail_businesses: Option<StatusCode>,
    /// When set, `POST /orders` answers with this status.
    pub fail_orders: Option<StatusCode>,
    next_address_id: i64,
}

impl MockBackend {
    /// Add a saved address directly, as if created elsewhere.
    pub fn seed_address(&mut self, name: &str) -> i64 {
        self.next_address_id += 1;
        let id = self.next_address_id;
        self.addresses.push(json!({
            "id": id,
            "name": name,
            "address": format!("{name} Street {id}, Tel Aviv"),
            "coordinates": { "lat": 32.08, "lng": 34.78 },
            "deleted": false,
        }));
        id
    }
}

type Shared = Arc<Mutex<MockBackend>>;

fn lock(state: &Shared) -> MutexGuard<'_, MockBackend> {
    state.lock().expect("Mock backend lock poisoned")
}

/// Build the mock router, mounted under `/v1`.
pub fn router(state: Shared) -> Router {
    let api = Router::new()
        .route("/health", get(|| async { StatusCode::OK }))
        .route("/auth/send-code", post(send_code))
        .route("/auth/verify-code", post(verify_code))
        .route("/businesses", get(businesses))
        .route("/businesses/{id}/categories", get(categories))
        .route(
            "/businesses/{id}/categories/{category_id}/items",
            get(category_items),
        )
        .route("/items/{id}", get(item))
        .route("/addresses", get(list_addresses).post(create_address))
        .route("/addresses/search", get(search_addresses))
        .route("/addresses/{id}", delete(delete_address))
        .route("/delivery/quote", get(delivery_quote))
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/{id}", get(show_order))
        .route("/orders/{id}/pay", post(pay_order))
        .route("/cards", get(list_cards).post(begin_card_setup))
        .route("/cards/{id}", delete(delete_card))
        .with_state(state);

    Router::new().nest("/v1", api)
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn authorized(headers: &HeaderMap) -> Result<(), Response> {
    let expected = format!("Bearer {TEST_TOKEN}");
    match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err(error(StatusCode::UNAUTHORIZED, "Invalid token")),
    }
}

// =============================================================================
// Catalog fixture
// =============================================================================

fn business_fixture(id: i64) -> Option<Value> {
    let (name, address) = match id {
        1 => ("Nightcap Dizengoff", "Dizengoff St 50, Tel Aviv"),
        2 => ("Nightcap Florentin", "Florentin St 12, Tel Aviv"),
        _ => return None,
    };
    Some(json!({
        "id": id,
        "name": name,
        "address": address,
        "coordinates": { "lat": 32.07, "lng": 34.77 },
    }))
}

fn item_fixture(id: i64) -> Option<Value> {
    let value = match id {
        10 => json!({
            "id": 10, "business_id": 1, "category_id": 1,
            "name": "Negroni Kit", "price": "50.00", "stock": 3,
        }),
        11 => json!({
            "id": 11, "business_id": 1, "category_id": 1,
            "name": "Sold Out Mezcal", "price": "120.00", "stock": 0,
        }),
        12 => json!({
            "id": 12, "business_id": 1, "category_id": 1,
            "name": "House Gin", "price": "100.00", "stock": 5,
            "modifier_groups": [
                {
                    "name": "Bottle size", "min_select": 1, "max_select": 1,
                    "options": [
                        { "id": 1, "name": "700ml", "price": "100.00", "pricing": "REPLACE" },
                        { "id": 2, "name": "1L", "price": "140.00", "pricing": "REPLACE" },
                    ],
                },
                {
                    "name": "Extras", "min_select": 0, "max_select": 2,
                    "options": [
                        { "id": 3, "name": "Tonic", "price": "9.50", "pricing": "ADD" },
                        { "id": 4, "name": "Lime", "price": "2.00", "pricing": "ADD" },
                    ],
                },
            ],
        }),
        20 => json!({
            "id": 20, "business_id": 2, "category_id": 2,
            "name": "Lager Six-Pack", "price": "30.00", "stock": 10,
        }),
        _ => return None,
    };
    Some(value)
}

async fn businesses(State(state): State<Shared>) -> Response {
    if let Some(status) = lock(&state).fail_businesses {
        return error(status, "Catalog unavailable");
    }
    Json(Value::Array(
        [1, 2].into_iter().filter_map(business_fixture).collect(),
    ))
    .into_response()
}

async fn categories(Path(business_id): Path<i64>) -> Response {
    if business_fixture(business_id).is_none() {
        return error(StatusCode::NOT_FOUND, "Business not found");
    }
    Json(json!([
        { "id": business_id, "business_id": business_id, "name": "Spirits" },
    ]))
    .into_response()
}

async fn category_items(Path((business_id, category_id)): Path<(i64, i64)>) -> Json<Value> {
    Json(Value::Array(
        [10, 11, 12, 20]
            .into_iter()
            .filter_map(item_fixture)
            .filter(|item| item["business_id"] == business_id && item["category_id"] == category_id)
            .collect(),
    ))
}

async fn item(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut backend = lock(&state);
    backend.item_hits += 1;
    let Some(mut item) = item_fixture(id) else {
        return error(StatusCode::NOT_FOUND, "Item not found");
    };
    if let Some(stock) = backend.stock.get(&id) {
        item["stock"] = json!(stock);
    }
    Json(item).into_response()
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Deserialize)]
struct SendCodeBody {
    phone: String,
}

async fn send_code(State(state): State<Shared>, Json(body): Json<SendCodeBody>) -> Response {
    if !body.phone.starts_with('+') && !body.phone.starts_with('0') {
        return error(StatusCode::UNPROCESSABLE_ENTITY, "Unsupported phone number");
    }
    lock(&state).send_code_calls += 1;
    Json(json!({ "session_token": SESSION_TOKEN })).into_response()
}

#[derive(Deserialize)]
struct VerifyBody {
    phone: String,
    code: String,
    session_token: String,
}

async fn verify_code(Json(body): Json<VerifyBody>) -> Response {
    if body.session_token != SESSION_TOKEN || body.code != TEST_CODE {
        return error(StatusCode::BAD_REQUEST, "Wrong code");
    }
    Json(json!({
        "user": { "id": 7, "phone": body.phone, "name": "Dana" },
        "token": TEST_TOKEN,
    }))
    .into_response()
}

// =============================================================================
// Addresses & delivery
// =============================================================================

async fn list_addresses(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(rejection) = authorized(&headers) {
        return rejection;
    }
    Json(Value::Array(lock(&state).addresses.clone())).into_response()
}

async fn create_address(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    if let Err(rejection) = authorized(&headers) {
        return rejection;
    }
    let mut backend = lock(&state);
    backend.next_address_id += 1;
    body["id"] = json!(backend.next_address_id);
    body["deleted"] = json!(false);
    backend.addresses.push(body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

#[derive(Deserialize)]
struct SearchParams {
    query: String,
}

async fn search_addresses(headers: HeaderMap, Query(params): Query<SearchParams>) -> Response {
    if let Err(rejection) = authorized(&headers) {
        return rejection;
    }
    Json(json!([
        {
            "label": format!("{}, Tel Aviv", params.query),
            "address": format!("{}, Tel Aviv-Yafo, Israel", params.query),
            "coordinates": { "lat": 32.06, "lng": 34.77 },
        },
    ]))
    .into_response()
}

async fn delete_address(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if let Err(rejection) = authorized(&headers) {
        return rejection;
    }
    let mut backend = lock(&state);
    match backend.addresses.iter_mut().find(|a| a["id"] == id) {
        Some(address) => {
            // Soft delete, like the real backend
            address["deleted"] = json!(true);
            StatusCode::NO_CONTENT.into_response()
        }
        None => error(StatusCode::NOT_FOUND, "Address not found"),
    }
}

#[derive(Deserialize)]
struct QuoteParams {
    business_id: i64,
    address_id: i64,
}

async fn delivery_quote(headers: HeaderMap, Query(params): Query<QuoteParams>) -> Response {
    if let Err(rejection) = authorized(&headers) {
        return rejection;
    }
    // Only the Dizengoff branch delivers
    if params.business_id != 1 {
        return Json(json!({ "available": false })).into_response();
    }
    Json(json!({
        "available": true,
        "price": "15.00",
        "eta_minutes": 35 + params.address_id,
    }))
    .into_response()
}

// =============================================================================
// Orders & cards
// =============================================================================

async fn create_order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(rejection) = authorized(&headers) {
        return rejection;
    }

    let mut backend = lock(&state);
    if let Some(status) = backend.fail_orders {
        return error(status, "Order rejected");
    }
    backend.order_requests.push(body.clone());

    let id = 1000 + i64::try_from(backend.orders.len()).unwrap_or(0);
    let lines: Vec<Value> = body["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .map(|line| {
                    let name = line["item_id"]
                        .as_i64()
                        .and_then(item_fixture)
                        .map_or(Value::Null, |item| item["name"].clone());
                    json!({
                        "item_id": line["item_id"],
                        "name": name,
                        "quantity": line["quantity"],
                        "unit_price": "50.00",
                        "total": "50.00",
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let order = json!({
        "id": id,
        "business_id": body["business_id"],
        "fulfillment": body["fulfillment"],
        "status": 0,
        "items": lines,
        "cost": {
            "subtotal": "100.00",
            "delivery_price": "15.00",
            "total": "115.00",
        },
        "created_at": "2026-10-19T18:30:00Z",
    });
    backend.orders.push(order.clone());
    (StatusCode::CREATED, Json(order)).into_response()
}

async fn list_orders(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(rejection) = authorized(&headers) {
        return rejection;
    }
    Json(Value::Array(lock(&state).orders.clone())).into_response()
}

async fn show_order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if let Err(rejection) = authorized(&headers) {
        return rejection;
    }
    lock(&state)
        .orders
        .iter()
        .find(|o| o["id"] == id)
        .cloned()
        .map_or_else(
            || error(StatusCode::NOT_FOUND, "Order not found"),
            |order| Json(order).into_response(),
        )
}

#[derive(Deserialize)]
struct PayBody {
    card_id: i64,
}

async fn pay_order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<PayBody>,
) -> Response {
    if let Err(rejection) = authorized(&headers) {
        return rejection;
    }
    let mut backend = lock(&state);
    if !backend.cards.iter().any(|c| c["id"] == body.card_id) {
        return error(StatusCode::UNPROCESSABLE_ENTITY, "Unknown card");
    }
    match backend.orders.iter_mut().find(|o| o["id"] == id) {
        Some(order) => {
            order["status"] = json!(1);
            Json(json!({ "order_id": id, "status": 1 })).into_response()
        }
        None => error(StatusCode::NOT_FOUND, "Order not found"),
    }
}

async fn list_cards(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(rejection) = authorized(&headers) {
        return rejection;
    }
    Json(Value::Array(lock(&state).cards.clone())).into_response()
}

#[derive(Deserialize)]
struct CardSetupBody {
    return_url: String,
}

async fn begin_card_setup(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<CardSetupBody>,
) -> Response {
    if let Err(rejection) = authorized(&headers) {
        return rejection;
    }
    let mut backend = lock(&state);
    backend.card_setup_return_urls.push(body.return_url.clone());

    // The bank "saves" the card immediately
    let id = 500 + i64::try_from(backend.cards.len()).unwrap_or(0);
    backend.cards.push(json!({
        "id": id,
        "brand": "visa",
        "last4": "4242",
        "expiry": "12/29",
    }));

    Json(json!({
        "redirect_url": format!("https://bank.test/setup?return={}", body.return_url),
    }))
    .into_response()
}

async fn delete_card(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if let Err(rejection) = authorized(&headers) {
        return rejection;
    }
    let mut backend = lock(&state);
    let before = backend.cards.len();
    backend.cards.retain(|c| c["id"] != id);
    if backend.cards.len() == before {
        return error(StatusCode::NOT_FOUND, "Card not found");
    }
    StatusCode::NO_CONTENT.into_response()
}
