//! Address route handlers.
//!
//! All address routes need a signed-in customer: addresses belong to the
//! backend account, only the selection lives in the session.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use nightcap_core::AddressId;

use crate::backend::{Address, AddressSuggestion, DeliveryQuote, NewAddress};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::AuthSession;
use crate::services::address::{self, AddressBook};
use crate::services::business;
use crate::state::AppState;

/// Shortest query worth geocoding.
const MIN_SEARCH_CHARS: usize = 2;

/// Address search query.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

/// Select address request.
#[derive(Debug, Deserialize)]
pub struct SelectAddressRequest {
    pub address_id: AddressId,
}

/// Result of selecting an address.
#[derive(Debug, Serialize)]
pub struct SelectAddressResponse {
    pub address: Option<Address>,
    /// Recomputed when a business is selected.
    pub delivery_quote: Option<DeliveryQuote>,
}

/// List saved addresses with the effective selection.
#[instrument(skip_all)]
pub async fn list(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<AddressBook>> {
    let addresses = state.backend().addresses(auth.token.expose()).await?;
    Ok(Json(address::resolve(&session, addresses).await?))
}

/// Geocoding lookup.
#[instrument(skip_all)]
pub async fn search(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<AddressSuggestion>>> {
    let q = query.q.trim();
    if q.chars().count() < MIN_SEARCH_CHARS {
        return Err(AppError::BadRequest(format!(
            "Search needs at least {MIN_SEARCH_CHARS} characters"
        )));
    }

    Ok(Json(
        state
            .backend()
            .search_addresses(auth.token.expose(), q)
            .await?,
    ))
}

/// Save a new address. The first address becomes the selection.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    Json(new_address): Json<NewAddress>,
) -> Result<(StatusCode, Json<AddressBook>)> {
    if new_address.address.trim().is_empty() {
        return Err(AppError::BadRequest("Address line is required".to_string()));
    }

    let token = auth.token.expose();
    let created = state.backend().create_address(token, &new_address).await?;
    tracing::info!(address_id = %created.id, "Address created");

    let addresses = state.backend().addresses(token).await?;
    let book = address::added(&session, addresses, created.id).await?;

    Ok((StatusCode::CREATED, Json(book)))
}

/// Delete an address. Deleting the selected one moves the selection to the
/// first remaining address.
#[instrument(skip(state, session, auth))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Json<AddressBook>> {
    let token = auth.token.expose();
    state.backend().delete_address(token, id).await?;

    let addresses = state.backend().addresses(token).await?;
    Ok(Json(address::resolve(&session, addresses).await?))
}

/// The effective selected address, or `null`.
#[instrument(skip_all)]
pub async fn selected(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<Option<Address>>> {
    let addresses = state.backend().addresses(auth.token.expose()).await?;
    let book = address::resolve(&session, addresses).await?;
    Ok(Json(book.selected().cloned()))
}

/// Select an address and, if a business is selected, quote delivery to it.
#[instrument(skip(state, session, auth, request), fields(address_id = %request.address_id))]
pub async fn select(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    Json(request): Json<SelectAddressRequest>,
) -> Result<Json<SelectAddressResponse>> {
    let addresses = state.backend().addresses(auth.token.expose()).await?;
    let book = address::select(&session, addresses, request.address_id).await?;

    let delivery_quote = quote_for_selection(&state, &session, &auth, request.address_id).await?;

    Ok(Json(SelectAddressResponse {
        address: book.selected().cloned(),
        delivery_quote,
    }))
}

/// Quote delivery for a freshly selected address. A failed quote doesn't
/// undo the selection; the checkout quote endpoint will surface it.
async fn quote_for_selection(
    state: &AppState,
    session: &Session,
    auth: &AuthSession,
    address_id: AddressId,
) -> Result<Option<DeliveryQuote>> {
    let Some(selected_business) = business::selected(session).await? else {
        return Ok(None);
    };

    match state
        .backend()
        .delivery_quote(auth.token.expose(), selected_business.id, address_id)
        .await
    {
        Ok(quote) => Ok(Some(quote)),
        Err(e) => {
            tracing::warn!(error = %e, business_id = %selected_business.id, "Delivery quote failed");
            Ok(None)
        }
    }
}
