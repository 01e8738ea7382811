//! Order history and payment.
//!
//! Orders are read-only mirrors of the backend; statuses and totals are never
//! computed here.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use tracing::instrument;

use nightcap_core::{CardId, OrderId};

use crate::backend::{Order, PaymentResult};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Pay order request.
#[derive(Debug, Deserialize)]
pub struct PayOrderRequest {
    pub card_id: CardId,
}

/// The customer's orders.
#[instrument(skip_all)]
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(state.backend().orders(auth.token.expose()).await?))
}

/// One order.
#[instrument(skip(state, auth))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    Ok(Json(state.backend().order(auth.token.expose(), id).await?))
}

/// Charge an order to a saved card.
///
/// The result may carry a 3-D Secure `redirect_url` the client must open.
#[instrument(skip(state, auth, request), fields(card_id = %request.card_id))]
pub async fn pay(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<OrderId>,
    Json(request): Json<PayOrderRequest>,
) -> Result<Json<PaymentResult>> {
    let result = state
        .backend()
        .pay_order(auth.token.expose(), id, request.card_id)
        .await?;

    tracing::info!(
        order_id = %id,
        status = %result.status,
        three_ds = result.redirect_url.is_some(),
        "Order payment submitted"
    );
    Ok(Json(result))
}
