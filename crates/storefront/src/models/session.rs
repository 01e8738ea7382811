//! Session-related types.
//!
//! Types stored in the session for authentication state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::backend::AuthUser;

/// Opaque bearer token issued by the backend after phone verification.
///
/// `Debug` is redacted so the token never lands in logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BearerToken(String);

impl BearerToken {
    #[must_use]
    pub const fn new(token: String) -> Self {
        Self(token)
    }

    /// The raw token, for the `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken([REDACTED])")
    }
}

/// A signed-in customer: the user record plus the token that goes with it.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: AuthUser,
    pub token: BearerToken,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_debug_is_redacted() {
        let token = BearerToken::new("tok_live_abcdef".to_string());
        assert!(!format!("{token:?}").contains("abcdef"));
        assert_eq!(token.expose(), "tok_live_abcdef");
    }
}
