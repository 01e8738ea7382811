//! Saved addresses and the visitor's selected delivery address.
//!
//! The addresses themselves belong to the backend. Only the selected ID is
//! kept in the session, and it is always re-validated against the current
//! list: a stale or missing selection falls back to the first live address.

use serde::Serialize;
use thiserror::Error;
use tower_sessions::Session;

use nightcap_core::AddressId;

use crate::backend::Address;
use crate::persistence::{self, PersistenceError, keys};

/// Errors from address selection.
#[derive(Debug, Error)]
pub enum AddressError {
    #[error("address {0} not found")]
    Unknown(AddressId),

    #[error("address {0} has been deleted")]
    Deleted(AddressId),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Address list paired with the effective selection.
#[derive(Debug, Clone, Serialize)]
pub struct AddressBook {
    pub addresses: Vec<Address>,
    pub selected_id: Option<AddressId>,
}

impl AddressBook {
    /// Build a book from the backend list and the stored selection,
    /// applying the fallback.
    #[must_use]
    pub fn new(addresses: Vec<Address>, stored: Option<AddressId>) -> Self {
        let selected_id = effective_selection(&addresses, stored);
        Self {
            addresses,
            selected_id,
        }
    }

    /// The selected address record.
    #[must_use]
    pub fn selected(&self) -> Option<&Address> {
        let id = self.selected_id?;
        self.addresses.iter().find(|a| a.id == id)
    }
}

/// The stored selection if it still names a live address, otherwise the
/// first live address.
#[must_use]
pub fn effective_selection(addresses: &[Address], stored: Option<AddressId>) -> Option<AddressId> {
    let live = |id: AddressId| addresses.iter().any(|a| a.id == id && !a.deleted);

    stored
        .filter(|id| live(*id))
        .or_else(|| addresses.iter().find(|a| !a.deleted).map(|a| a.id))
}

/// The raw stored selection, without validation.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn stored_selection(session: &Session) -> Result<Option<AddressId>, PersistenceError> {
    persistence::load(session, keys::SELECTED_ADDRESS_ID).await
}

/// Build the book for `addresses` and write back the effective selection if
/// the fallback changed it.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn resolve(
    session: &Session,
    addresses: Vec<Address>,
) -> Result<AddressBook, PersistenceError> {
    let stored = stored_selection(session).await?;
    let book = AddressBook::new(addresses, stored);

    if book.selected_id != stored {
        store_selection(session, book.selected_id).await?;
    }

    Ok(book)
}

/// Select `id` from `addresses`.
///
/// # Errors
///
/// Returns an error if `id` is not in the list, is deleted, or the session
/// store fails.
pub async fn select(
    session: &Session,
    addresses: Vec<Address>,
    id: AddressId,
) -> Result<AddressBook, AddressError> {
    let address = addresses
        .iter()
        .find(|a| a.id == id)
        .ok_or(AddressError::Unknown(id))?;
    if address.deleted {
        return Err(AddressError::Deleted(id));
    }

    store_selection(session, Some(id)).await?;
    Ok(AddressBook {
        addresses,
        selected_id: Some(id),
    })
}

/// Record a newly created address.
///
/// The new address becomes the selection only when nothing live was
/// selected before (i.e., it is the visitor's first address).
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn added(
    session: &Session,
    addresses: Vec<Address>,
    new_id: AddressId,
) -> Result<AddressBook, PersistenceError> {
    let stored = stored_selection(session).await?;
    let before: Vec<_> = addresses.iter().filter(|a| a.id != new_id).cloned().collect();

    if effective_selection(&before, stored).is_none() {
        store_selection(session, Some(new_id)).await?;
    }

    resolve(session, addresses).await
}

async fn store_selection(
    session: &Session,
    id: Option<AddressId>,
) -> Result<(), PersistenceError> {
    match id {
        Some(id) => persistence::save(session, keys::SELECTED_ADDRESS_ID, &id).await,
        None => persistence::remove(session, keys::SELECTED_ADDRESS_ID).await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use crate::persistence::testing;
    use nightcap_core::Coordinates;

    pub(crate) fn address(id: i64, deleted: bool) -> Address {
        Address {
            id: AddressId::new(id),
            name: format!("Place {id}"),
            address: format!("Herzl {id}"),
            coordinates: Coordinates::new(32.0, 34.8).unwrap(),
            apartment: None,
            entrance: None,
            floor: None,
            notes: None,
            deleted,
        }
    }

    #[test]
    fn test_fallback_to_first_live() {
        let list = vec![address(1, true), address(2, false), address(3, false)];
        assert_eq!(effective_selection(&list, None), Some(AddressId::new(2)));
        assert_eq!(
            effective_selection(&list, Some(AddressId::new(1))),
            Some(AddressId::new(2))
        );
        assert_eq!(
            effective_selection(&list, Some(AddressId::new(99))),
            Some(AddressId::new(2))
        );
        assert_eq!(
            effective_selection(&list, Some(AddressId::new(3))),
            Some(AddressId::new(3))
        );
    }

    #[test]
    fn test_no_live_addresses() {
        assert_eq!(effective_selection(&[], None), None);
        assert_eq!(
            effective_selection(&[address(1, true)], Some(AddressId::new(1))),
            None
        );
    }

    #[test]
    fn test_book_selected_skips_deleted() {
        let book = AddressBook::new(vec![address(1, true), address(2, false)], None);
        assert_eq!(book.selected().unwrap().id, AddressId::new(2));
    }

    #[tokio::test]
    async fn test_resolve_persists_fallback() {
        let session = testing::session();
        persistence::save(&session, keys::SELECTED_ADDRESS_ID, &AddressId::new(7))
            .await
            .unwrap();

        let book = resolve(&session, vec![address(4, false), address(5, false)])
            .await
            .unwrap();
        assert_eq!(book.selected_id, Some(AddressId::new(4)));
        assert_eq!(
            stored_selection(&session).await.unwrap(),
            Some(AddressId::new(4))
        );

        resolve(&session, Vec::new()).await.unwrap();
        assert_eq!(stored_selection(&session).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_select_validates_id() {
        let session = testing::session();
        let list = vec![address(1, false), address(2, true)];

        assert!(matches!(
            select(&session, list.clone(), AddressId::new(9)).await,
            Err(AddressError::Unknown(_))
        ));
        assert!(matches!(
            select(&session, list.clone(), AddressId::new(2)).await,
            Err(AddressError::Deleted(_))
        ));

        let book = select(&session, list, AddressId::new(1)).await.unwrap();
        assert_eq!(book.selected_id, Some(AddressId::new(1)));
    }

    #[tokio::test]
    async fn test_first_added_becomes_selected() {
        let session = testing::session();

        let book = added(&session, vec![address(1, false)], AddressId::new(1))
            .await
            .unwrap();
        assert_eq!(book.selected_id, Some(AddressId::new(1)));

        // A second address does not steal the selection
        let book = added(
            &session,
            vec![address(1, false), address(2, false)],
            AddressId::new(2),
        )
        .await
        .unwrap();
        assert_eq!(book.selected_id, Some(AddressId::new(1)));
    }

    #[tokio::test]
    async fn test_deleting_selected_reruns_fallback() {
        let session = testing::session();
        select(
            &session,
            vec![address(1, false), address(2, false)],
            AddressId::new(1),
        )
        .await
        .unwrap();

        let book = resolve(&session, vec![address(1, true), address(2, false)])
            .await
            .unwrap();
        assert_eq!(book.selected_id, Some(AddressId::new(2)));
    }
}
