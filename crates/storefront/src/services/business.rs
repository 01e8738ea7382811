//! Business (store) selection.
//!
//! The visitor orders from one business at a time. The full business record
//! is kept in the session so the header can render without a backend call.

use serde::Serialize;
use tower_sessions::Session;

use nightcap_core::BusinessId;

use crate::backend::Business;
use crate::persistence::{self, PersistenceError, keys};

/// A change of selected business.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusinessChange {
    pub previous: Option<BusinessId>,
    pub current: BusinessId,
}

impl BusinessChange {
    /// Whether the cart should be emptied for this change.
    ///
    /// Picking a first business never clears anything; only switching from one
    /// business to another does, and only when `clear_on_change` is enabled.
    #[must_use]
    pub const fn should_clear_cart(&self, clear_on_change: bool) -> bool {
        clear_on_change && self.previous.is_some()
    }
}

/// The selected business, if any.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn selected(session: &Session) -> Result<Option<Business>, PersistenceError> {
    persistence::load(session, keys::SELECTED_BUSINESS).await
}

/// Store `business` as the selection.
///
/// Returns the change if the ID differs from the previous selection, or
/// `None` if the same business was picked again (the stored record is still
/// refreshed).
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn select(
    session: &Session,
    business: &Business,
) -> Result<Option<BusinessChange>, PersistenceError> {
    let previous = selected(session).await?.map(|b| b.id);
    persistence::save(session, keys::SELECTED_BUSINESS, business).await?;

    if previous == Some(business.id) {
        return Ok(None);
    }

    Ok(Some(BusinessChange {
        previous,
        current: business.id,
    }))
}

/// Remember the business list last shown to the visitor.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn remember_list(
    session: &Session,
    businesses: &[Business],
) -> Result<(), PersistenceError> {
    persistence::save(session, keys::BUSINESSES, &businesses).await
}

/// The business list last shown to the visitor, if any.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn remembered_list(session: &Session) -> Result<Option<Vec<Business>>, PersistenceError> {
    persistence::load(session, keys::BUSINESSES).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use crate::persistence::testing;
    use nightcap_core::Coordinates;

    pub(crate) fn business(id: i64) -> Business {
        Business {
            id: BusinessId::new(id),
            name: format!("Store {id}"),
            address: "Dizengoff 50".to_string(),
            coordinates: Coordinates::new(32.07, 34.77).unwrap(),
            logo_url: None,
            cover_url: None,
        }
    }

    #[tokio::test]
    async fn test_first_selection_reports_change_without_previous() {
        let session = testing::session();
        let change = select(&session, &business(1)).await.unwrap().unwrap();

        assert_eq!(change.previous, None);
        assert_eq!(change.current, BusinessId::new(1));
        assert!(!change.should_clear_cart(true));
    }

    #[tokio::test]
    async fn test_switching_business() {
        let session = testing::session();
        select(&session, &business(1)).await.unwrap();
        let change = select(&session, &business(2)).await.unwrap().unwrap();

        assert_eq!(change.previous, Some(BusinessId::new(1)));
        assert!(change.should_clear_cart(true));
        assert!(!change.should_clear_cart(false));

        let stored = selected(&session).await.unwrap().unwrap();
        assert_eq!(stored.id, BusinessId::new(2));
    }

    #[tokio::test]
    async fn test_reselecting_same_business_is_not_a_change() {
        let session = testing::session();
        select(&session, &business(3)).await.unwrap();
        assert!(select(&session, &business(3)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remember_list() {
        let session = testing::session();
        assert!(remembered_list(&session).await.unwrap().is_none());

        remember_list(&session, &[business(1), business(2)]).await.unwrap();

        let stored = remembered_list(&session).await.unwrap().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored.last().map(|b| b.id), Some(BusinessId::new(2)));
    }
}
