//! Authentication extractors.
//!
//! Read the signed-in customer from the session for route handlers.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::AuthSession;
use crate::services::auth;

/// Extractor that requires a signed-in customer.
///
/// Rejects with a JSON 401 when there is no user or token in the session.
///
/// # Example
///
/// ```rust,ignore
/// async fn orders(
///     State(state): State<AppState>,
///     RequireAuth(auth): RequireAuth,
/// ) -> Result<Json<Vec<Order>>> {
///     Ok(Json(state.backend().orders(auth.token.expose()).await?))
/// }
/// ```
pub struct RequireAuth(pub AuthSession);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        auth::current(session)
            .await?
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized("Sign in required".to_string()))
    }
}

/// Extractor that optionally gets the signed-in customer.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is
/// signed in.
pub struct OptionalAuth(pub Option<AuthSession>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth = match parts.extensions.get::<Session>() {
            Some(session) => auth::current(session).await.ok().flatten(),
            None => None,
        };

        Ok(Self(auth))
    }
}
