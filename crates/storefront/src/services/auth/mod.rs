//! Authentication service.
//!
//! Phone-number sign-in: the backend texts a code, the visitor sends it back,
//! and the backend answers with a user record and a bearer token. Both go into
//! the session. There is no refresh or rotation; a new sign-in simply
//! overwrites the previous one.

mod error;

pub use error::AuthError;

use tower_sessions::Session;
use tracing::instrument;

use nightcap_core::PhoneNumber;

use crate::backend::{AuthUser, BackendClient};
use crate::models::{AuthSession, BearerToken};
use crate::persistence::{self, PersistenceError, keys};

/// Accepted verification code lengths.
const CODE_LENGTH: std::ops::RangeInclusive<usize> = 4..=8;

/// Authentication service.
///
/// Borrows the backend client and the visitor's session for one request.
pub struct AuthService<'a> {
    backend: &'a BackendClient,
    session: &'a Session,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(backend: &'a BackendClient, session: &'a Session) -> Self {
        Self { backend, session }
    }

    /// Ask the backend to text a sign-in code, and keep the session token it
    /// returns for the verification step.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidPhone` if the number doesn't validate, or a
    /// backend/session error.
    #[instrument(skip(self, phone))]
    pub async fn send_code(&self, phone: &str) -> Result<PhoneNumber, AuthError> {
        let phone = PhoneNumber::parse(phone)?;
        let response = self.backend.send_code(&phone).await?;

        persistence::save(self.session, keys::SESSION_TOKEN, &response.session_token).await?;
        tracing::info!(phone = %phone.masked(), "Sign-in code sent");

        Ok(phone)
    }

    /// Verify a texted code and sign the visitor in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NoPendingCode` if no code was requested in this
    /// session, `AuthError::InvalidCode` for malformed codes, or a
    /// backend/session error (a wrong code surfaces as a backend error).
    #[instrument(skip(self, phone, code))]
    pub async fn verify_code(&self, phone: &str, code: &str) -> Result<AuthUser, AuthError> {
        let phone = PhoneNumber::parse(phone)?;
        let code = code.trim();
        if !CODE_LENGTH.contains(&code.len()) || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(AuthError::InvalidCode);
        }

        let session_token: String = persistence::load(self.session, keys::SESSION_TOKEN)
            .await?
            .ok_or(AuthError::NoPendingCode)?;

        let response = self
            .backend
            .verify_code(&phone, code, &session_token)
            .await?;

        let auth = AuthSession {
            user: response.user,
            token: BearerToken::new(response.token),
        };
        store(self.session, &auth).await?;
        // New session ID on privilege change
        self.session
            .cycle_id()
            .await
            .map_err(PersistenceError::from)?;
        tracing::info!(user_id = %auth.user.id, "Customer signed in");

        Ok(auth.user)
    }

    /// Sign the visitor out.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn logout(&self) -> Result<(), AuthError> {
        clear(self.session).await?;
        Ok(())
    }
}

/// The signed-in customer, if both the user record and token are present.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn current(session: &Session) -> Result<Option<AuthSession>, PersistenceError> {
    let user: Option<AuthUser> = persistence::load(session, keys::USER).await?;
    let token: Option<BearerToken> = persistence::load(session, keys::TOKEN).await?;

    Ok(user.zip(token).map(|(user, token)| AuthSession { user, token }))
}

/// Store a sign-in, overwriting any previous one.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn store(session: &Session, auth: &AuthSession) -> Result<(), PersistenceError> {
    persistence::save(session, keys::USER, &auth.user).await?;
    persistence::save(session, keys::TOKEN, &auth.token).await
}

/// Remove the user, token and pending session token.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn clear(session: &Session) -> Result<(), PersistenceError> {
    persistence::remove(session, keys::USER).await?;
    persistence::remove(session, keys::TOKEN).await?;
    persistence::remove(session, keys::SESSION_TOKEN).await
}
