//! Cart route handlers.
//!
//! The cart lives in the session. Every mutation answers with the full cart
//! view so the client never has to re-fetch it.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use nightcap_core::{BusinessId, ItemId, ModifierId, Price};

use crate::error::{AppError, Result};
use crate::services::cart::{
    self, AddOutcome, Cart, CartItem, SelectedModifier, UpdateOutcome, select_modifiers,
};
use crate::state::AppState;

/// Cart line display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub item_id: ItemId,
    pub business_id: BusinessId,
    pub name: String,
    pub image_url: Option<String>,
    pub modifiers: Vec<SelectedModifier>,
    pub quantity: u32,
    pub stock: u32,
    pub unit_price: Price,
    pub line_total: Price,
}

/// Cart display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total_items: u32,
    /// Display estimate; the backend prices the order at checkout.
    pub total_price: Price,
}

impl From<&CartItem> for CartItemView {
    fn from(line: &CartItem) -> Self {
        Self {
            item_id: line.item_id,
            business_id: line.business_id,
            name: line.name.clone(),
            image_url: line.image_url.clone(),
            modifiers: line.modifiers.clone(),
            quantity: line.cart_quantity,
            stock: line.stock,
            unit_price: line.unit_price(),
            line_total: line.line_total(),
        }
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items().iter().map(CartItemView::from).collect(),
            total_items: cart.total_items(),
            total_price: cart.total_price(),
        }
    }
}

/// Add to cart request.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub item_id: ItemId,
    pub quantity: Option<u32>,
    #[serde(default)]
    pub modifier_ids: Vec<ModifierId>,
}

/// Update quantity request. Zero or negative removes the line.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

/// Result of an add.
#[derive(Debug, Serialize)]
pub struct AddToCartResponse {
    pub outcome: AddOutcome,
    pub cart: CartView,
}

/// Result of a quantity update.
#[derive(Debug, Serialize)]
pub struct UpdateQuantityResponse {
    pub outcome: UpdateOutcome,
    pub cart: CartView,
}

/// Cart count badge.
#[derive(Debug, Serialize)]
pub struct CartCount {
    pub count: u32,
}

/// Show the cart.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<CartView>> {
    let cart = cart::load(&session).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Add an item to the cart.
///
/// The item is fetched from the backend so the price, stock ceiling and
/// modifiers are authoritative, not whatever the client sent.
#[instrument(skip(state, session, request), fields(item_id = %request.item_id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<AddToCartResponse>> {
    let item = state.backend().item_fresh(request.item_id).await?;
    let modifiers = select_modifiers(&item, &request.modifier_ids)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let line = CartItem::from_item(&item, modifiers);
    let quantity = request.quantity.unwrap_or(1);

    let (cart, outcome) = cart::mutate(&session, |c| c.add_item(line, quantity)).await?;

    match outcome {
        AddOutcome::Inserted | AddOutcome::Incremented => {
            tracing::debug!(?outcome, quantity, "Cart item added");
        }
        AddOutcome::StockLimit | AddOutcome::Rejected | AddOutcome::ModifiersDiffer => {
            tracing::info!(?outcome, quantity, stock = item.stock, "Cart add refused");
        }
    }

    Ok(Json(AddToCartResponse {
        outcome,
        cart: CartView::from(&cart),
    }))
}

/// Set the quantity of a cart line.
#[instrument(skip(session, request), fields(quantity = request.quantity))]
pub async fn update(
    session: Session,
    Path(item_id): Path<ItemId>,
    Json(request): Json<UpdateQuantityRequest>,
) -> Result<Json<UpdateQuantityResponse>> {
    let (cart, outcome) =
        cart::mutate(&session, |c| c.update_quantity(item_id, request.quantity)).await?;

    Ok(Json(UpdateQuantityResponse {
        outcome,
        cart: CartView::from(&cart),
    }))
}

/// Remove a line from the cart.
#[instrument(skip(session))]
pub async fn remove(session: Session, Path(item_id): Path<ItemId>) -> Result<Json<CartView>> {
    let (cart, _) = cart::mutate(&session, |c| c.remove_item(item_id)).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Empty the cart.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Json<CartView>> {
    let (cart, ()) = cart::mutate(&session, Cart::clear).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Cart count badge.
#[instrument(skip(session))]
pub async fn count(session: Session) -> Result<Json<CartCount>> {
    let cart = cart::load(&session).await?;
    Ok(Json(CartCount {
        count: cart.total_items(),
    }))
}
