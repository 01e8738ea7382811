//! Authentication route handlers.
//!
//! Phone-code sign-in. `POST /api/auth/code` and `POST /api/auth/verify` sit
//! behind the sign-in rate limiter.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::AuthUser;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::OptionalAuth;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Request a sign-in code.
#[derive(Debug, Deserialize)]
pub struct SendCodeRequest {
    pub phone: String,
}

/// Code sent; the phone number is masked for display.
#[derive(Debug, Serialize)]
pub struct SendCodeResponse {
    pub sent: bool,
    pub phone: String,
}

/// Verify a sign-in code.
#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    pub phone: String,
    pub code: String,
}

/// Text a sign-in code to the given phone number.
#[instrument(skip_all)]
pub async fn send_code(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<SendCodeRequest>,
) -> Result<Json<SendCodeResponse>> {
    let phone = AuthService::new(state.backend(), &session)
        .send_code(&request.phone)
        .await?;

    Ok(Json(SendCodeResponse {
        sent: true,
        phone: phone.masked(),
    }))
}

/// Verify the texted code and sign in.
#[instrument(skip_all)]
pub async fn verify(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<VerifyCodeRequest>,
) -> Result<Json<AuthUser>> {
    let user = AuthService::new(state.backend(), &session)
        .verify_code(&request.phone, &request.code)
        .await?;

    set_sentry_user(&user.id);
    Ok(Json(user))
}

/// Sign out. The cart and selections stay.
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, session: Session) -> Result<StatusCode> {
    AuthService::new(state.backend(), &session).logout().await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The signed-in customer.
#[instrument(skip_all)]
pub async fn me(OptionalAuth(auth): OptionalAuth) -> Result<Json<AuthUser>> {
    auth.map(|a| Json(a.user))
        .ok_or_else(|| AppError::Unauthorized("Not signed in".to_string()))
}
