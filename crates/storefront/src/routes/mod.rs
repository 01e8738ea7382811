//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                                   - Liveness
//! GET    /health/ready                             - Readiness (pings backend)
//!
//! # Cart
//! GET    /api/cart                                 - Cart with totals
//! POST   /api/cart/items                           - Add item
//! PATCH  /api/cart/items/{item_id}                 - Set quantity (<= 0 removes)
//! DELETE /api/cart/items/{item_id}                 - Remove line
//! DELETE /api/cart                                 - Empty cart
//! GET    /api/cart/count                           - Unit count badge
//!
//! # Businesses & catalog
//! GET    /api/businesses                           - List businesses
//! GET    /api/businesses/selected                  - Selected business
//! PUT    /api/businesses/selected                  - Select business
//! GET    /api/businesses/{id}/categories           - Categories
//! GET    /api/businesses/{id}/categories/{cid}/items - Items in category
//! GET    /api/items/{id}                           - Item with modifiers
//!
//! # Auth (code + verify are rate limited)
//! POST   /api/auth/code                            - Text a sign-in code
//! POST   /api/auth/verify                          - Verify code, sign in
//! POST   /api/auth/logout                          - Sign out
//! GET    /api/auth/me                              - Signed-in customer
//!
//! # Addresses (requires auth)
//! GET    /api/addresses                            - List with selection
//! POST   /api/addresses                            - Create
//! GET    /api/addresses/search?q=                  - Geocoding lookup
//! DELETE /api/addresses/{id}                       - Delete
//! GET    /api/addresses/selected                   - Selected address
//! PUT    /api/addresses/selected                   - Select (+ delivery quote)
//!
//! # Notifications
//! GET    /api/notifications                        - List
//! POST   /api/notifications                        - Record
//! DELETE /api/notifications                        - Clear
//! POST   /api/notifications/{id}/read              - Mark one read
//! POST   /api/notifications/read-all               - Mark all read
//!
//! # Checkout, orders & payment (requires auth)
//! GET    /api/checkout/quote                       - Delivery quote
//! POST   /api/checkout                             - Place order
//! GET    /api/orders                               - Order history
//! GET    /api/orders/{id}                          - Order detail
//! POST   /api/orders/{id}/pay                      - Pay with saved card
//! GET    /api/payment/cards                        - Saved cards
//! POST   /api/payment/cards                        - Start card setup
//! DELETE /api/payment/cards/{id}                   - Remove card
//! GET    /api/payment/card-added                   - Poll card-added flag
//! GET    /payment/card-added                       - Bank redirect landing
//! ```

pub mod addresses;
pub mod auth;
pub mod businesses;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod health;
pub mod notifications;
pub mod orders;
pub mod payment;

use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route(
            "/items/{item_id}",
            patch(cart::update).delete(cart::remove),
        )
        .route("/count", get(cart::count))
}

/// Create the business and catalog routes router.
pub fn business_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(businesses::list))
        .route(
            "/selected",
            get(businesses::selected).put(businesses::select),
        )
        .route("/{id}/categories", get(catalog::categories))
        .route(
            "/{id}/categories/{category_id}/items",
            get(catalog::items),
        )
}

/// Create the auth routes router.
///
/// Code and verify share one per-IP limiter.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/code", post(auth::send_code))
        .route("/verify", post(auth::verify))
        .route_layer(auth_rate_limiter());

    Router::new()
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .merge(limited)
}

/// Create the address routes router.
pub fn address_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(addresses::list).post(addresses::create))
        .route("/search", get(addresses::search))
        .route(
            "/selected",
            get(addresses::selected).put(addresses::select),
        )
        .route("/{id}", delete(addresses::delete))
}

/// Create the notification routes router.
pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(notifications::list)
                .post(notifications::record)
                .delete(notifications::clear),
        )
        .route("/read-all", post(notifications::mark_all_read))
        .route("/{id}/read", post(notifications::mark_read))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list))
        .route("/{id}", get(orders::show))
        .route("/{id}/pay", post(orders::pay))
}

/// Create the payment routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/cards",
            get(payment::list_cards).post(payment::add_card),
        )
        .route("/cards/{id}", delete(payment::delete_card))
        .route("/card-added", get(payment::card_added_status))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api/cart", cart_routes())
        .nest("/api/businesses", business_routes())
        .route("/api/items/{id}", get(catalog::item))
        .nest("/api/auth", auth_routes())
        .nest("/api/addresses", address_routes())
        .nest("/api/notifications", notification_routes())
        .route("/api/checkout", post(checkout::place))
        .route("/api/checkout/quote", get(checkout::quote))
        .nest("/api/orders", order_routes())
        .nest("/api/payment", payment_routes())
        // Bank redirect target
        .route(payment::CARD_ADDED_PATH, get(payment::card_added_landing))
}
