//! Stored notifications.
//!
//! Push delivery happens on the client; the storefront only keeps the list the
//! client records so it survives reloads and other tabs. Newest first, capped
//! at [`MAX_NOTIFICATIONS`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use uuid::Uuid;

use crate::persistence::{self, PersistenceError, keys};

/// Maximum number of notifications kept; older ones are dropped.
pub const MAX_NOTIFICATIONS: usize = 50;

/// A stored notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub link: Option<String>,
    pub received_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

/// Content of a notification to record.
#[derive(Debug, Clone, Deserialize)]
pub struct NewNotification {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub link: Option<String>,
}

/// The visitor's notification list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inbox {
    entries: Vec<Notification>,
}

impl Inbox {
    /// Entries, newest first.
    #[must_use]
    pub fn entries(&self) -> &[Notification] {
        &self.entries
    }

    /// Prepend a notification, dropping the oldest entries past the cap.
    pub fn record(&mut self, new: NewNotification, received_at: DateTime<Utc>) -> Notification {
        let notification = Notification {
            id: Uuid::new_v4(),
            title: new.title,
            body: new.body,
            link: new.link,
            received_at,
            read: false,
        };
        self.entries.insert(0, notification.clone());
        self.entries.truncate(MAX_NOTIFICATIONS);
        notification
    }

    /// Mark one notification read. Returns whether it was found.
    pub fn mark_read(&mut self, id: Uuid) -> bool {
        self.entries
            .iter_mut()
            .find(|n| n.id == id)
            .map(|n| n.read = true)
            .is_some()
    }

    pub fn mark_all_read(&mut self) {
        for n in &mut self.entries {
            n.read = true;
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.entries.iter().filter(|n| !n.read).count()
    }
}

/// Load the visitor's notifications.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn load(session: &Session) -> Result<Inbox, PersistenceError> {
    persistence::load_or_default(session, keys::NOTIFICATIONS).await
}

/// Load the inbox, apply `f`, and write it back.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn mutate<R>(
    session: &Session,
    f: impl FnOnce(&mut Inbox) -> R + Send,
) -> Result<(Inbox, R), PersistenceError> {
    let mut inbox = load(session).await?;
    let result = f(&mut inbox);
    persistence::save(session, keys::NOTIFICATIONS, &inbox).await?;
    Ok((inbox, result))
}
