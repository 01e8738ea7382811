//! Per-visitor persistence on top of the server-side session.
//!
//! Every piece of visitor state is a JSON blob stored under one fixed key.
//! Writers always replace the whole blob; there is no merging and the last
//! write wins.

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tower_sessions::Session;

/// Session keys for visitor state.
pub mod keys {
    /// Cart contents.
    pub const CART: &str = "cart";

    /// ID of the address the visitor picked for delivery.
    pub const SELECTED_ADDRESS_ID: &str = "selectedAddressId";

    /// The business (store) the visitor is ordering from.
    pub const SELECTED_BUSINESS: &str = "selectedBusiness";

    /// Last business list fetched for this visitor.
    pub const BUSINESSES: &str = "businesses";

    /// Signed-in user record.
    pub const USER: &str = "user";

    /// Backend bearer token.
    pub const TOKEN: &str = "token";

    /// Backend session token handed out with a sign-in code.
    pub const SESSION_TOKEN: &str = "session_token";

    /// Stored notifications.
    pub const NOTIFICATIONS: &str = "notifications";

    /// Set by the bank redirect once a card has been saved.
    pub const CARD_ADDED: &str = "cardAdded";
}

/// Errors from the session store.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("session store error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

/// Load the blob stored under `key`.
///
/// # Errors
///
/// Returns an error if the session store fails or the blob does not
/// deserialize as `T`.
pub async fn load<T: DeserializeOwned>(
    session: &Session,
    key: &str,
) -> Result<Option<T>, PersistenceError> {
    Ok(session.get::<T>(key).await?)
}

/// Load the blob stored under `key`, or `T::default()` if there is none.
///
/// # Errors
///
/// Returns an error if the session store fails or the blob does not
/// deserialize as `T`.
pub async fn load_or_default<T: DeserializeOwned + Default>(
    session: &Session,
    key: &str,
) -> Result<T, PersistenceError> {
    Ok(load(session, key).await?.unwrap_or_default())
}

/// Replace the blob stored under `key`.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save<T: Serialize + Sync>(
    session: &Session,
    key: &str,
    value: &T,
) -> Result<(), PersistenceError> {
    session.insert(key, value).await?;
    Ok(())
}

/// Remove the blob stored under `key`, if any.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn remove(session: &Session, key: &str) -> Result<(), PersistenceError> {
    session.remove_value(key).await?;
    Ok(())
}

/// Read the blob stored under `key` and remove it in the same step.
///
/// # Errors
///
/// Returns an error if the session store fails or the blob does not
/// deserialize as `T`.
pub async fn take<T: DeserializeOwned>(
    session: &Session,
    key: &str,
) -> Result<Option<T>, PersistenceError> {
    Ok(session.remove::<T>(key).await?)
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_missing_key_is_none() {
        let session = testing::session();
        let value: Option<Vec<u32>> = load(&session, keys::CART).await.unwrap();
        assert!(value.is_none());

        let value: Vec<u32> = load_or_default(&session, keys::CART).await.unwrap();
        assert!(value.is_empty());
    }

    #[tokio::test]
    async fn test_save_replaces_blob() {
        let session = testing::session();
        save(&session, keys::NOTIFICATIONS, &vec![1, 2, 3]).await.unwrap();
        save(&session, keys::NOTIFICATIONS, &vec![4]).await.unwrap();

        let value: Vec<u32> = load_or_default(&session, keys::NOTIFICATIONS).await.unwrap();
        assert_eq!(value, vec![4]);
    }

    #[tokio::test]
    async fn test_take_removes() {
        let session = testing::session();
        save(&session, keys::CARD_ADDED, &true).await.unwrap();

        assert_eq!(take::<bool>(&session, keys::CARD_ADDED).await.unwrap(), Some(true));
        assert_eq!(take::<bool>(&session, keys::CARD_ADDED).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_mismatched_type_is_an_error() {
        let session = testing::session();
        save(&session, keys::TOKEN, &"abc").await.unwrap();

        let result = load::<u64>(&session, keys::TOKEN).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_remove() {
        let session = testing::session();
        save(&session, keys::SELECTED_ADDRESS_ID, &5_i64).await.unwrap();
        remove(&session, keys::SELECTED_ADDRESS_ID).await.unwrap();

        let value: Option<i64> = load(&session, keys::SELECTED_ADDRESS_ID).await.unwrap();
        assert!(value.is_none());
    }
}
