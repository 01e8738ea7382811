//! Authentication error types.

use thiserror::Error;

use crate::backend::BackendError;
use crate::persistence::PersistenceError;

/// Errors that can occur during phone sign-in.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Phone number failed validation.
    #[error("invalid phone number: {0}")]
    InvalidPhone(#[from] nightcap_core::PhoneError),

    /// Verification attempted before a code was requested.
    #[error("no sign-in code has been requested")]
    NoPendingCode,

    /// Code is empty or not made of digits.
    #[error("invalid verification code")]
    InvalidCode,

    /// Backend call failed (including a rejected code).
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Session store error.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
