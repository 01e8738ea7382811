//! Business listing and selection.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use nightcap_core::BusinessId;

use crate::backend::Business;
use crate::error::Result;
use crate::services::business::{self, BusinessChange};
use crate::services::cart::{self, Cart};
use crate::state::AppState;

/// Select business request.
#[derive(Debug, Deserialize)]
pub struct SelectBusinessRequest {
    pub business_id: BusinessId,
}

/// Result of selecting a business.
#[derive(Debug, Serialize)]
pub struct SelectBusinessResponse {
    pub business: Business,
    /// Present when the selection actually changed.
    pub change: Option<BusinessChange>,
    pub cart_cleared: bool,
}

/// List businesses and remember the list for this visitor.
///
/// If the backend is unavailable, the list this visitor last saw is served
/// instead.
#[instrument(skip(state, session))]
pub async fn list(State(state): State<AppState>, session: Session) -> Result<Json<Vec<Business>>> {
    match state.backend().businesses().await {
        Ok(businesses) => {
            business::remember_list(&session, &businesses).await?;
            Ok(Json(businesses))
        }
        Err(err) => {
            let Some(remembered) = business::remembered_list(&session).await? else {
                return Err(err.into());
            };
            tracing::warn!(error = %err, "Backend unavailable, serving remembered business list");
            Ok(Json(remembered))
        }
    }
}

/// The selected business, or `null`.
#[instrument(skip(session))]
pub async fn selected(session: Session) -> Result<Json<Option<Business>>> {
    Ok(Json(business::selected(&session).await?))
}

/// Select a business.
///
/// Switching away from another business with a non-empty cart either empties
/// the cart or only logs, depending on `clear_cart_on_business_change`.
#[instrument(skip(state, session, request), fields(business_id = %request.business_id))]
pub async fn select(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<SelectBusinessRequest>,
) -> Result<Json<SelectBusinessResponse>> {
    let selected = state.backend().business(request.business_id).await?;
    let change = business::select(&session, &selected).await?;

    let mut cart_cleared = false;
    if let Some(change) = &change {
        let current_cart = cart::load(&session).await?;
        if change.previous.is_some() && !current_cart.is_empty() {
            if change.should_clear_cart(state.config().clear_cart_on_business_change) {
                cart::save(&session, &Cart::default()).await?;
                cart_cleared = true;
                tracing::info!(?change, "Business changed, cart cleared");
            } else {
                tracing::info!(
                    ?change,
                    lines = current_cart.items().len(),
                    "Business changed, cart kept"
                );
            }
        }
    }

    Ok(Json(SelectBusinessResponse {
        business: selected,
        change,
        cart_cleared,
    }))
}
