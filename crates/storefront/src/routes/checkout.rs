//! Checkout route handlers.

use axum::{Json, extract::State, http::StatusCode};
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::{DeliveryQuote, Order};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::checkout::{self, CheckoutError, CheckoutRequest};
use crate::services::{address, business};
use crate::state::AppState;

/// Delivery availability and price for the selected business and address.
#[instrument(skip_all)]
pub async fn quote(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<DeliveryQuote>> {
    let selected_business = business::selected(&session)
        .await?
        .ok_or(CheckoutError::NoBusiness)?;

    let token = auth.token.expose();
    let addresses = state.backend().addresses(token).await?;
    let address_id = address::resolve(&session, addresses)
        .await?
        .selected_id
        .ok_or(CheckoutError::NoAddress)?;

    let quote = state
        .backend()
        .delivery_quote(token, selected_business.id, address_id)
        .await?;
    Ok(Json(quote))
}

/// Place an order from the cart. The cart is emptied on success.
#[instrument(skip_all)]
pub async fn place(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let order = checkout::place_order(state.backend(), &session, &auth.token, request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}
