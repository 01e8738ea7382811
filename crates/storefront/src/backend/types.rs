//! Wire types for the ordering backend's REST API.
//!
//! The backend is the source of truth for every one of these. The storefront
//! stores some of them in the session (businesses, the auth user) but never
//! computes prices or statuses on its own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use nightcap_core::{
    AddressId, BusinessId, CardId, CategoryId, Coordinates, Fulfillment, ItemId, ModifierId,
    ModifierPricing, OrderId, OrderStatus, Price, UserId,
};

// =============================================================================
// Catalog
// =============================================================================

/// A store location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Business {
    pub id: BusinessId,
    pub name: String,
    pub address: String,
    pub coordinates: Coordinates,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
}

/// A catalog category within a business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub business_id: BusinessId,
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A sellable item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub business_id: BusinessId,
    pub category_id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub price: Price,
    /// Units available right now; the cart never holds more than this.
    pub stock: u32,
    #[serde(default)]
    pub modifier_groups: Vec<ModifierGroup>,
}

/// A group of modifiers the customer picks from (e.g., "Bottle size").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierGroup {
    pub name: String,
    #[serde(default)]
    pub min_select: u32,
    pub max_select: u32,
    pub options: Vec<ModifierOption>,
}

/// One pickable modifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierOption {
    pub id: ModifierId,
    pub name: String,
    pub price: Price,
    pub pricing: ModifierPricing,
}

// =============================================================================
// Addresses & delivery
// =============================================================================

/// A saved delivery address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    /// Free-text label ("Home", "Office").
    pub name: String,
    pub address: String,
    pub coordinates: Coordinates,
    #[serde(default)]
    pub apartment: Option<String>,
    #[serde(default)]
    pub entrance: Option<String>,
    #[serde(default)]
    pub floor: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Soft-delete flag; deleted addresses stay in the list but are never selected.
    #[serde(default)]
    pub deleted: bool,
}

/// Body for creating an address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAddress {
    pub name: String,
    pub address: String,
    pub coordinates: Coordinates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apartment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entrance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A geocoding suggestion returned by address search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressSuggestion {
    pub label: String,
    pub address: String,
    pub coordinates: Coordinates,
}

/// Delivery eligibility and price for an address and business pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryQuote {
    pub available: bool,
    #[serde(default)]
    pub price: Option<Price>,
    #[serde(default)]
    pub eta_minutes: Option<u32>,
    #[serde(default)]
    pub zone_id: Option<i64>,
}

// =============================================================================
// Auth
// =============================================================================

/// The signed-in customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    pub phone: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SendCodeRequest<'a> {
    pub phone: &'a str,
}

/// Response to a code request.
#[derive(Debug, Clone, Deserialize)]
pub struct SendCodeResponse {
    pub session_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct VerifyCodeRequest<'a> {
    pub phone: &'a str,
    pub code: &'a str,
    pub session_token: &'a str,
}

/// Response to a successful code verification.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyCodeResponse {
    pub user: AuthUser,
    pub token: String,
}

// =============================================================================
// Orders & payment
// =============================================================================

/// Order submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub business_id: BusinessId,
    pub fulfillment: Fulfillment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_id: Option<AddressId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_id: Option<CardId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub items: Vec<OrderLineRequest>,
}

/// One line of an order submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineRequest {
    pub item_id: ItemId,
    pub quantity: u32,
    pub modifier_ids: Vec<ModifierId>,
}

/// A placed order as the backend reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub business_id: BusinessId,
    pub fulfillment: Fulfillment,
    pub status: OrderStatus,
    pub items: Vec<OrderLine>,
    pub cost: OrderCost,
    #[serde(default)]
    pub address: Option<Address>,
    pub created_at: DateTime<Utc>,
}

/// A line of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item_id: ItemId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Price,
    pub total: Price,
}

/// Cost breakdown computed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCost {
    pub subtotal: Price,
    #[serde(default)]
    pub delivery_price: Price,
    #[serde(default)]
    pub service_fee: Price,
    #[serde(default)]
    pub discount: Price,
    pub total: Price,
}

/// A saved payment card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub brand: String,
    pub last4: String,
    pub expiry: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CardSetupRequest<'a> {
    pub return_url: &'a str,
}

/// Bank-hosted page that collects a new card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSetup {
    pub redirect_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct PayOrderRequest {
    pub card_id: CardId,
}

/// Result of charging an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentResult {
    pub order_id: OrderId,
    pub status: OrderStatus,
    /// Present when the bank requires a 3-D Secure step.
    #[serde(default)]
    pub redirect_url: Option<String>,
}
