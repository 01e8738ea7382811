//! Catalog route handlers.
//!
//! Straight pass-through to the backend's cached catalog endpoints.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use nightcap_core::{BusinessId, CategoryId, ItemId};

use crate::backend::{Category, Item};
use crate::error::Result;
use crate::state::AppState;

/// Categories of a business.
#[instrument(skip(state))]
pub async fn categories(
    State(state): State<AppState>,
    Path(business_id): Path<BusinessId>,
) -> Result<Json<Vec<Category>>> {
    Ok(Json(state.backend().categories(business_id).await?))
}

/// Items in a category.
#[instrument(skip(state))]
pub async fn items(
    State(state): State<AppState>,
    Path((business_id, category_id)): Path<(BusinessId, CategoryId)>,
) -> Result<Json<Vec<Item>>> {
    Ok(Json(state.backend().items(business_id, category_id).await?))
}

/// One item with its modifier groups.
#[instrument(skip(state))]
pub async fn item(State(state): State<AppState>, Path(item_id): Path<ItemId>) -> Result<Json<Item>> {
    Ok(Json(state.backend().item(item_id).await?))
}
