//! Checkout: turning the session cart into a backend order.
//!
//! The storefront only checks that an order is well formed. Pricing,
//! delivery eligibility and payment are decided by the backend.

use serde::Deserialize;
use thiserror::Error;
use tower_sessions::Session;
use tracing::instrument;

use nightcap_core::{AddressId, BusinessId, CardId, Fulfillment, ItemId};

use crate::backend::{BackendClient, BackendError, Order, OrderLineRequest, OrderRequest};
use crate::models::BearerToken;
use crate::persistence::PersistenceError;
use crate::services::cart::{self, Cart};
use crate::services::{address, business};

/// Longest order comment accepted.
const MAX_COMMENT_CHARS: usize = 500;

/// What the customer submits at checkout.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub fulfillment: Fulfillment,
    #[serde(default)]
    pub card_id: Option<CardId>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Errors that stop an order from being placed.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("no business selected")]
    NoBusiness,

    #[error("delivery needs an address")]
    NoAddress,

    #[error("cart has items from another business")]
    ForeignItems {
        business_id: BusinessId,
        items: Vec<ItemId>,
    },

    #[error("comment is too long (max {MAX_COMMENT_CHARS} characters)")]
    CommentTooLong,

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Build the order request for `cart`.
///
/// # Errors
///
/// Returns an error if the cart is empty, no business is selected, delivery
/// is requested without an address, a line belongs to another business, or
/// the comment is too long.
pub fn build_order_request(
    cart: &Cart,
    business_id: Option<BusinessId>,
    address_id: Option<AddressId>,
    request: CheckoutRequest,
) -> Result<OrderRequest, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    let business_id = business_id.ok_or(CheckoutError::NoBusiness)?;

    let foreign: Vec<_> = cart.foreign_items(business_id).map(|l| l.item_id).collect();
    if !foreign.is_empty() {
        return Err(CheckoutError::ForeignItems {
            business_id,
            items: foreign,
        });
    }

    let address_id = if request.fulfillment.needs_address() {
        Some(address_id.ok_or(CheckoutError::NoAddress)?)
    } else {
        None
    };

    let comment = request
        .comment
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    if comment
        .as_ref()
        .is_some_and(|c| c.chars().count() > MAX_COMMENT_CHARS)
    {
        return Err(CheckoutError::CommentTooLong);
    }

    Ok(OrderRequest {
        business_id,
        fulfillment: request.fulfillment,
        address_id,
        card_id: request.card_id,
        comment,
        items: cart
            .items()
            .iter()
            .map(|line| OrderLineRequest {
                item_id: line.item_id,
                quantity: line.cart_quantity,
                modifier_ids: line.modifiers.iter().map(|m| m.id).collect(),
            })
            .collect(),
    })
}

/// Place an order from the session's cart and selections, then empty the
/// cart.
///
/// # Errors
///
/// Returns a validation error from [`build_order_request`], or a
/// backend/session error. The cart is left untouched on any error.
#[instrument(skip(backend, session, token, request), fields(fulfillment = ?request.fulfillment))]
pub async fn place_order(
    backend: &BackendClient,
    session: &Session,
    token: &BearerToken,
    request: CheckoutRequest,
) -> Result<Order, CheckoutError> {
    let current_cart = cart::load(session).await?;
    let business_id = business::selected(session).await?.map(|b| b.id);

    let address_id = if request.fulfillment.needs_address() {
        let addresses = backend.addresses(token.expose()).await?;
        address::resolve(session, addresses).await?.selected_id
    } else {
        None
    };

    let order_request = build_order_request(&current_cart, business_id, address_id, request)?;
    let order = backend.create_order(token.expose(), &order_request).await?;

    cart::save(session, &Cart::default()).await?;
    tracing::info!(order_id = %order.id, total = %order.cost.total, "Order placed");

    Ok(order)
}
