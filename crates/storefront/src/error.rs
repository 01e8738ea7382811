//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Clients always get a JSON body of the form `{"error": "..."}`.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::backend::BackendError;
use crate::persistence::PersistenceError;
use crate::services::address::AddressError;
use crate::services::auth::AuthError;
use crate::services::checkout::CheckoutError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Ordering backend call failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Sign-in failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Order could not be placed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Address selection failed.
    #[error("Address error: {0}")]
    Address(#[from] AddressError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// The backend error underneath this one, if any.
    fn backend_source(&self) -> Option<&BackendError> {
        match self {
            Self::Backend(err)
            | Self::Auth(AuthError::Backend(err))
            | Self::Checkout(CheckoutError::Backend(err)) => Some(err),
            _ => None,
        }
    }

    /// Whether this is our fault (or the backend's) rather than the client's.
    fn is_server_error(&self) -> bool {
        if let Some(err) = self.backend_source() {
            return backend_status(err).is_server_error();
        }
        matches!(
            self,
            Self::Persistence(_)
                | Self::Internal(_)
                | Self::Auth(AuthError::Persistence(_))
                | Self::Checkout(CheckoutError::Persistence(_))
                | Self::Address(AddressError::Persistence(_))
        )
    }

    fn status(&self) -> StatusCode {
        if let Some(err) = self.backend_source() {
            return backend_status(err);
        }

        match self {
            Self::Persistence(_)
            | Self::Internal(_)
            | Self::Auth(AuthError::Persistence(_))
            | Self::Checkout(CheckoutError::Persistence(_))
            | Self::Address(AddressError::Persistence(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Checkout(CheckoutError::ForeignItems { .. })
            | Self::Address(AddressError::Deleted(_)) => StatusCode::CONFLICT,
            Self::Checkout(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Address(AddressError::Unknown(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            // Backend-carrying variants are handled above
            Self::Backend(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Message safe to show to the client.
    fn public_message(&self) -> String {
        if let Some(err) = self.backend_source() {
            return backend_message(err);
        }

        if self.is_server_error() {
            return "Internal server error".to_string();
        }

        match self {
            Self::Auth(AuthError::InvalidPhone(_)) => "Invalid phone number".to_string(),
            Self::Auth(AuthError::NoPendingCode) => "Request a sign-in code first".to_string(),
            Self::Auth(AuthError::InvalidCode) => "Invalid verification code".to_string(),
            Self::Checkout(err) => err.to_string(),
            Self::Address(err) => err.to_string(),
            Self::NotFound(what) => format!("Not found: {what}"),
            Self::Unauthorized(msg) | Self::BadRequest(msg) => msg.clone(),
            _ => self.to_string(),
        }
    }
}

/// Status for a backend failure as seen by our client.
fn backend_status(err: &BackendError) -> StatusCode {
    match err {
        BackendError::Unauthorized => StatusCode::UNAUTHORIZED,
        BackendError::NotFound(_) => StatusCode::NOT_FOUND,
        BackendError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        BackendError::Api { status, .. } if err.is_client_error() => {
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_REQUEST)
        }
        _ => StatusCode::BAD_GATEWAY,
    }
}

fn backend_message(err: &BackendError) -> String {
    match err {
        BackendError::Unauthorized => "Please sign in again".to_string(),
        BackendError::NotFound(_) => "Not found".to_string(),
        BackendError::RateLimited(_) => "Too many requests".to_string(),
        BackendError::Api { message, .. } if err.is_client_error() => message.clone(),
        _ => "External service error".to_string(),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, "Client error");
        }

        let status = self.status();
        let body = Json(json!({ "error": self.public_message() }));

        let mut response = (status, body).into_response();
        if let Some(BackendError::RateLimited(secs)) = self.backend_source() {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(*secs));
        }
        response
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after a successful sign-in to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use nightcap_core::{AddressId, BusinessId, PhoneNumber};

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("item 123".to_string());
        assert_eq!(err.to_string(), "Not found: item 123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_backend_error_mapping() {
        assert_eq!(
            get_status(BackendError::Unauthorized.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(BackendError::NotFound("orders/1".to_string()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(
                BackendError::Api {
                    status: 409,
                    message: "Item sold out".to_string()
                }
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(
                BackendError::Api {
                    status: 503,
                    message: "maintenance".to_string()
                }
                .into()
            ),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(BackendError::InvalidUrl("x".to_string()).into()),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_backend_error_nested_in_service_errors() {
        let err = AppError::Checkout(CheckoutError::Backend(BackendError::Unauthorized));
        assert_eq!(get_status(err), StatusCode::UNAUTHORIZED);

        let err = AppError::Auth(AuthError::Backend(BackendError::Api {
            status: 400,
            message: "Wrong code".to_string(),
        }));
        assert_eq!(err.public_message(), "Wrong code");
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = AppError::from(BackendError::RateLimited(30)).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(RETRY_AFTER).unwrap(), "30");
    }

    #[test]
    fn test_server_error_details_are_hidden() {
        let err = AppError::Backend(BackendError::Config("bad header".to_string()));
        assert_eq!(err.public_message(), "External service error");

        let err = AppError::Internal("pool exhausted".to_string());
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn test_service_error_mapping() {
        let phone_err = PhoneNumber::parse("12").unwrap_err();
        assert_eq!(
            get_status(AuthError::InvalidPhone(phone_err).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(CheckoutError::EmptyCart.into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(
                CheckoutError::ForeignItems {
                    business_id: BusinessId::new(1),
                    items: Vec::new()
                }
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AddressError::Unknown(AddressId::new(4)).into()),
            StatusCode::NOT_FOUND
        );
    }
}
