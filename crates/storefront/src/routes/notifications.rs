//! Notification route handlers.

use axum::{
    Json,
    extract::Path,
    http::StatusCode,
};
use chrono::Utc;
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::services::notifications::{self, Inbox, NewNotification, Notification};

/// Longest title or body accepted.
const MAX_FIELD_CHARS: usize = 1000;

/// Notification list with unread count.
#[derive(Debug, Serialize)]
pub struct InboxView {
    pub notifications: Vec<Notification>,
    pub unread: usize,
}

impl From<&Inbox> for InboxView {
    fn from(inbox: &Inbox) -> Self {
        Self {
            notifications: inbox.entries().to_vec(),
            unread: inbox.unread_count(),
        }
    }
}

/// List notifications, newest first.
#[instrument(skip_all)]
pub async fn list(session: Session) -> Result<Json<InboxView>> {
    let inbox = notifications::load(&session).await?;
    Ok(Json(InboxView::from(&inbox)))
}

/// Record a notification the client received.
#[instrument(skip_all)]
pub async fn record(
    session: Session,
    Json(new): Json<NewNotification>,
) -> Result<(StatusCode, Json<Notification>)> {
    if new.title.trim().is_empty() {
        return Err(AppError::BadRequest("Title is required".to_string()));
    }
    if new.title.chars().count() > MAX_FIELD_CHARS || new.body.chars().count() > MAX_FIELD_CHARS {
        return Err(AppError::BadRequest(format!(
            "Title and body are limited to {MAX_FIELD_CHARS} characters"
        )));
    }

    let (_, notification) =
        notifications::mutate(&session, |inbox| inbox.record(new, Utc::now())).await?;
    Ok((StatusCode::CREATED, Json(notification)))
}

/// Mark one notification read.
#[instrument(skip(session))]
pub async fn mark_read(session: Session, Path(id): Path<Uuid>) -> Result<Json<InboxView>> {
    let (inbox, found) = notifications::mutate(&session, |inbox| inbox.mark_read(id)).await?;
    if !found {
        return Err(AppError::NotFound(format!("notification {id}")));
    }
    Ok(Json(InboxView::from(&inbox)))
}

/// Mark every notification read.
#[instrument(skip_all)]
pub async fn mark_all_read(session: Session) -> Result<Json<InboxView>> {
    let (inbox, ()) = notifications::mutate(&session, Inbox::mark_all_read).await?;
    Ok(Json(InboxView::from(&inbox)))
}

/// Delete every notification.
#[instrument(skip_all)]
pub async fn clear(session: Session) -> Result<StatusCode> {
    notifications::mutate(&session, Inbox::clear).await?;
    Ok(StatusCode::NO_CONTENT)
}
