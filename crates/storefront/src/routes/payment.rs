//! Payment card route handlers.
//!
//! Cards are saved on a bank-hosted page opened in a popup. When the bank
//! sends the popup back to `/payment/card-added`, a flag is set in the
//! session; the main window polls `/api/payment/card-added`, which reports the
//! flag once and clears it.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::Html,
};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use nightcap_core::CardId;

use crate::backend::{Card, CardSetup};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::persistence::{self, keys};
use crate::state::AppState;

/// Path the bank redirects to once a card is saved.
pub const CARD_ADDED_PATH: &str = "/payment/card-added";

/// Card-added poll result.
#[derive(Debug, Serialize)]
pub struct CardAddedStatus {
    pub card_added: bool,
}

/// Saved cards.
#[instrument(skip_all)]
pub async fn list_cards(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<Vec<Card>>> {
    Ok(Json(state.backend().cards(auth.token.expose()).await?))
}

/// Start saving a card; returns the bank-hosted URL to open.
#[instrument(skip_all)]
pub async fn add_card(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<CardSetup>> {
    // A stale flag from an abandoned attempt must not satisfy this one
    persistence::remove(&session, keys::CARD_ADDED).await?;

    let return_url = format!(
        "{}{CARD_ADDED_PATH}",
        state.config().base_url.trim_end_matches('/')
    );
    let setup = state
        .backend()
        .begin_card_setup(auth.token.expose(), &return_url)
        .await?;
    Ok(Json(setup))
}

/// Remove a saved card.
#[instrument(skip(state, auth))]
pub async fn delete_card(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<CardId>,
) -> Result<StatusCode> {
    state.backend().delete_card(auth.token.expose(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Bank redirect landing. Sets the card-added flag.
#[instrument(skip_all)]
pub async fn card_added_landing(session: Session) -> Result<Html<&'static str>> {
    persistence::save(&session, keys::CARD_ADDED, &true).await?;
    tracing::info!("Card-added redirect received");
    Ok(Html(
        "<!doctype html><title>Card saved</title><p>Card saved. You can close this window.</p>",
    ))
}

/// Report and clear the card-added flag.
#[instrument(skip_all)]
pub async fn card_added_status(session: Session) -> Result<Json<CardAddedStatus>> {
    let card_added = persistence::take::<bool>(&session, keys::CARD_ADDED)
        .await?
        .unwrap_or(false);
    Ok(Json(CardAddedStatus { card_added }))
}
